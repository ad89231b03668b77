//! Request-level error taxonomy and its HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::features::{allowed_list, SOIL_TYPES, STATIONS};
use crate::types::ErrorBody;

/// Everything that can go wrong between a parsed request and a prediction.
///
/// The `Display` texts are part of the public contract: the frontend shows
/// them verbatim.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictError {
    #[error("Model or Scaler not loaded. Please verify your model files.")]
    ArtifactsNotLoaded,

    #[error("Invalid soil type: {0}. Allowed: {}", allowed_list(&SOIL_TYPES))]
    InvalidSoilType(String),

    #[error("Invalid station: {0}. Allowed: {}", allowed_list(&STATIONS))]
    InvalidStation(String),

    #[error("Feature mismatch: expected {expected}, got {got}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),
}

impl PredictError {
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }
}

// Domain errors keep the 200 status existing clients branch on.
impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.body())).into_response()
    }
}
