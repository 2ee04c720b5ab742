//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use chrono::Utc;
use tracing::info;

use super::AppState;
use super::types::{ErrorResponse, ViewQuery};
use crate::advisor::{Advisory, AdvisorError, AdvisoryRequest};
use crate::io::export::PowerReport;
use crate::view::{self, BuildingOverview, DashboardSnapshot, ResolvedView, View};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn unknown_building(name: &str) -> ApiError {
    error(StatusCode::NOT_FOUND, format!("unknown building \"{name}\""))
}

/// `GET /buildings` → 200 + landing overview
pub async fn list_buildings(State(state): State<Arc<AppState>>) -> Json<Vec<BuildingOverview>> {
    let sim = state.simulator.read().await;
    Json(view::landing(&sim))
}

/// `GET /buildings/{name}` → 200 + `DashboardSnapshot`, or 404
pub async fn get_building(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    let sim = state.simulator.read().await;
    sim.building(&name)
        .map(|b| Json(DashboardSnapshot::from_building(b)))
        .ok_or_else(|| unknown_building(&name))
}

/// `GET /view?building=NAME` → 200 + resolved view.
///
/// Missing or unknown buildings resolve to the landing view.
pub async fn get_view(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Json<ResolvedView> {
    let requested = query.building.map_or(View::Landing, View::select);
    let sim = state.simulator.read().await;
    Json(view::resolve(&requested, &sim))
}

/// `GET /buildings/{name}/report` → 200 + `PowerReport` as an attachment, or 404
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let report = {
        let sim = state.simulator.read().await;
        let building = sim.building(&name).ok_or_else(|| unknown_building(&name))?;
        PowerReport::from_building(building, Utc::now())
    };
    let disposition = format!("attachment; filename=\"{}\"", report.file_name());
    info!(building = %name, file = %report.file_name(), "report exported");
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(report)))
}

/// `POST /buildings/{name}/advisor` → 200 + `Advisory`.
///
/// 404 unknown building, 503 missing credential, 409 request already in
/// flight, 502 service failure.
pub async fn post_advisor(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Advisory>, ApiError> {
    // Snapshot under the read lock; the lock is released before the call.
    let request = {
        let sim = state.simulator.read().await;
        let building = sim.building(&name).ok_or_else(|| unknown_building(&name))?;
        AdvisoryRequest::from_building(building)
    };

    state.advisor.analyze(&request).await.map(Json).map_err(|err| {
        let status = match err {
            AdvisorError::MissingCredential { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AdvisorError::Busy => StatusCode::CONFLICT,
            AdvisorError::Request(_) => StatusCode::BAD_GATEWAY,
        };
        error(status, err.user_message())
    })
}
