use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct JourneyQuery {
    pub user_id: Option<String>,
    pub days: Option<u32>,
}

/// `GET /api/analytics/user-journey?user_id=&days=` — sessions for one user
/// in the trailing window, newest first, each with its action timeline.
#[tracing::instrument(skip(state))]
pub async fn get_user_journey(
    State(state): State<Arc<AppState>>,
    Query(query): Query<JourneyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = query
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("user_id is required".to_string()))?;

    let days = query.days.unwrap_or(7);
    if days == 0 || days > state.config.export_max_days {
        return Err(AppError::BadRequest(format!(
            "days must be between 1 and {}",
            state.config.export_max_days
        )));
    }

    let journey = state
        .analytics
        .get_user_journey(&user_id, days)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(json!({ "user_journey": journey })))
}
