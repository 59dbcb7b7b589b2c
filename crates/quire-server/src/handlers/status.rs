//! Build status endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Response for GET /api/status.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusResponse {
    /// A build has completed and its snapshot is served.
    ready: bool,
    /// A regeneration is running.
    building: bool,
    live_reload: bool,
    version: String,
}

/// Handle GET /api/status.
pub(crate) async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        ready: state.snapshot.is_ready(),
        building: state.dispatcher.is_building(),
        live_reload: state.live_reload_enabled(),
        version: state.version.clone(),
    })
}
