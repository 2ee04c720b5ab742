//! REST API over the live simulation.
//!
//! - `GET /buildings` — landing overview
//! - `GET /buildings/{name}` — dashboard snapshot
//! - `GET /view?building=NAME` — navigation with landing fallback
//! - `GET /buildings/{name}/report` — downloadable JSON report
//! - `POST /buildings/{name}/advisor` — AI advisory

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::advisor::Advisor;
use crate::session::SharedSimulator;

pub use types::{ErrorResponse, ViewQuery};

/// State shared by every handler.
///
/// Handlers only take read locks on the simulator; the session's tick task is
/// the sole writer.
pub struct AppState {
    /// Live simulator.
    pub simulator: SharedSimulator,
    /// Advisory requester (single in-flight request).
    pub advisor: Advisor,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/buildings", get(handlers::list_buildings))
        .route("/buildings/{name}", get(handlers::get_building))
        .route("/buildings/{name}/report", get(handlers::get_report))
        .route("/buildings/{name}/advisor", post(handlers::post_advisor))
        .route("/view", get(handlers::get_view))
        .with_state(state)
}

/// Binds to `addr` and serves the API until the server stops.
///
/// # Errors
///
/// Returns an I/O error if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
