use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::{error::AppError, state::AppState};

/// `GET /api/analytics/dashboard` — durable aggregations for the configured
/// window plus the current real-time snapshot under `"real_time"`.
#[tracing::instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let data = state
        .analytics
        .get_dashboard(state.config.dashboard_window_days)
        .await
        .map_err(AppError::Internal)?;

    let real_time = state.realtime.snapshot().await;

    Ok(Json(json!({
        "session_stats": data.session_stats,
        "platform_usage": data.platform_usage,
        "action_types": data.action_types,
        "performance_stats": data.performance_stats,
        "feature_stats": data.feature_stats,
        "real_time": real_time,
    })))
}
