//! HTTP surface: shared state, router, and the two handlers.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, Request, Response},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::error::PredictError;
use crate::features::{build_features, check_dimension, FEATURE_NAMES};
use crate::model::Artifacts;
use crate::types::{ErrorBody, FloodInput, PredictionOut, ServiceInfo};

pub const SERVICE_TITLE: &str = "FloodShield - Flood Prediction API";

/// Browser origins allowed to call the API with credentials.
pub const ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:5173", "https://floodshield-phi.vercel.app"];

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    /// `None` when loading failed at startup; never changes afterwards.
    artifacts: Option<Arc<Artifacts>>,
    log_features: bool,
}

impl AppState {
    pub fn new(artifacts: Option<Artifacts>, log_features: bool) -> Self {
        Self {
            artifacts: artifacts.map(Arc::new),
            log_features,
        }
    }

    pub fn artifacts_loaded(&self) -> bool {
        self.artifacts.is_some()
    }
}

/// Load both artifacts, or neither. Failure is logged, not fatal.
pub fn load_artifacts(cfg: &ServiceConfig) -> Option<Artifacts> {
    match Artifacts::load(&cfg.model_path(), &cfg.scaler_path()) {
        Ok(art) => {
            info!(
                "model and scaler loaded; in_dim={} classifier={}",
                art.n_features(),
                art.classifier.kind()
            );
            Some(art)
        }
        Err(e) => {
            warn!("model or scaler unavailable, /predict will refuse requests: {:#}", e);
            None
        }
    }
}

// ---------- Prediction ----------

/// Validate, encode, scale and classify one request.
pub fn run_prediction(state: &AppState, input: &FloodInput) -> Result<PredictionOut, PredictError> {
    let art = state.artifacts.as_ref().ok_or(PredictError::ArtifactsNotLoaded)?;

    let vec = build_features(input)?;
    check_dimension(&vec, art.n_features())?;

    let label = art
        .predict(&vec)
        .map_err(|e| PredictError::PredictionFailed(e.to_string()))?;

    if state.log_features {
        let sample: Vec<String> = FEATURE_NAMES
            .iter()
            .zip(vec.iter())
            .map(|(name, v)| format!("{}={:.3}", name, v))
            .collect();
        let p_flood = art
            .predict_proba(&vec)
            .map_err(|e| PredictError::PredictionFailed(e.to_string()))?;
        info!(
            "recv station={} in_dim={} p_flood={:.3} features=[{}]",
            input.station,
            vec.len(),
            p_flood,
            sample.join(", ")
        );
    }

    Ok(PredictionOut::from_label(label))
}

// ---------- Handlers ----------

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<FloodInput>, JsonRejection>,
) -> axum::response::Response {
    let Json(input) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            warn!(status = %rejection.status().as_u16(), "rejected body: {}", rejection.body_text());
            return (
                rejection.status(),
                Json(ErrorBody {
                    error: rejection.body_text(),
                }),
            )
                .into_response();
        }
    };

    match run_prediction(&state, &input) {
        Ok(out) => {
            info!(station = %input.station, prediction = out.prediction, "prediction served");
            Json(out).into_response()
        }
        Err(e) => {
            warn!(station = %input.station, "prediction refused: {}", e);
            e.into_response()
        }
    }
}

// ---------- Router ----------

pub fn cors_layer() -> CorsLayer {
    // credentialed responses may not use `*`, so methods/headers are mirrored
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(ALLOWED_ORIGINS.map(HeaderValue::from_static)))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!("request", method = %req.method(), uri = %req.uri())
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .layer(trace_layer)
        .layer(cors_layer())
        .with_state(state)
}
