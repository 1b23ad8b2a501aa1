//! REST API over the AEP pipeline and the descriptive analytics.
//!
//! Every analysis endpoint takes a multipart upload:
//! - `POST /analyze` runs the Monte Carlo AEP estimate
//! - `POST /analyze/data-quality`, `/wind-statistics`, `/weibull`,
//!   `/power-curve`, `/monthly-energy`, `/capacity-factor` return the
//!   matching analytics report
//!
//! `GET /` is a health check.

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tracing::info;

use crate::config::AnalystConfig;

/// Largest accepted request body. A year of 10-minute SCADA for a large
/// plant runs to tens of megabytes.
const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Application state shared across request handlers.
///
/// Read-only after startup; each request clones the config it needs.
pub struct AppState {
    /// Defaults for every request: simulation count, seed, window policy,
    /// plant capacity.
    pub config: AnalystConfig,
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/analyze", post(handlers::analyze))
        .route("/analyze/data-quality", post(handlers::data_quality))
        .route("/analyze/wind-statistics", post(handlers::wind_stats))
        .route("/analyze/weibull", post(handlers::weibull))
        .route("/analyze/power-curve", post(handlers::power_curve_handler))
        .route("/analyze/monthly-energy", post(handlers::monthly))
        .route("/analyze/capacity-factor", post(handlers::capacity))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Binds to the given address and serves the API until the server stops.
///
/// # Errors
///
/// Returns the I/O error if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
