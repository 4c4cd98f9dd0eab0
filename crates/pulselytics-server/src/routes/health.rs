use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

/// `GET /health` — liveness check.
///
/// Returns `200 OK` when DuckDB is reachable (normal idle state), with the
/// current active-session count from the real-time view. Returns
/// `503 Service Unavailable` when DuckDB is unreachable (file locked, disk
/// full, or the last flush attempt returned an error).
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let active_sessions = state.realtime.snapshot().await.active_sessions;
    let timestamp = Utc::now().to_rfc3339();

    match state.analytics.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "timestamp": timestamp,
                "active_sessions": active_sessions,
                "database_status": "connected",
                "version": env!("CARGO_PKG_VERSION")
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check: DuckDB unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": timestamp,
                    "active_sessions": active_sessions,
                    "database_status": "unreachable",
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
                .into_response()
        }
    }
}
