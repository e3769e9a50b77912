//! Read-only view over the relay's in-memory attempt log, for operator
//! tooling. Nothing here is persisted; the buffer resets with the process.

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;

use haulquote_relay::{AttemptRecord, RelayStats};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DiagnosticsResponse {
    pub stats: RelayStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
    pub capacity: usize,
    pub recent: Vec<AttemptRecord>,
}

pub async fn webhook_diagnostics(State(state): State<AppState>) -> Json<DiagnosticsResponse> {
    Json(DiagnosticsResponse {
        stats: state.diagnostics.stats().await,
        success_rate: state.diagnostics.success_rate().await,
        capacity: state.diagnostics.capacity(),
        recent: state.diagnostics.recent().await,
    })
}
