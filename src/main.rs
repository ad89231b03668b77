use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use floodshield::server::{self, AppState, SERVICE_TITLE};
use floodshield::ServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = ServiceConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    info!("starting {} v{}", SERVICE_TITLE, env!("CARGO_PKG_VERSION"));
    let artifacts = server::load_artifacts(&cfg);
    info!("model directory: {}", cfg.model_dir.display());

    let state = AppState::new(artifacts, cfg.log_features);
    if !state.artifacts_loaded() {
        warn!("serving without artifacts; only GET / is functional");
    }
    let app = server::router(state);

    let addr = cfg.addr()?;
    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}
