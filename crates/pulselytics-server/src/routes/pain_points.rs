use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};

use crate::{error::AppError, state::AppState};

/// `GET /api/analytics/pain-points` — UI/UX pain-point indicators over the
/// configured dashboard window: slow actions, low-engagement platforms, and
/// short sessions.
#[tracing::instrument(skip(state))]
pub async fn get_pain_points(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let result = state
        .analytics
        .get_pain_points(state.config.dashboard_window_days)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(result))
}
