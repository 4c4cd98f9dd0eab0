use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};

use crate::state::AppState;

/// `GET /api/analytics/realtime` — the current real-time snapshot alone:
/// active sessions, recent-action count, feature counters, and the trailing
/// samples per metric type.
#[tracing::instrument(skip(state))]
pub async fn get_realtime(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.realtime.snapshot().await)
}
