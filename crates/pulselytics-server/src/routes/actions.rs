use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use pulselytics_core::event::{ActionPayload, ActionRecord, AnalyticsRow};

use crate::routes::{client_ip, DEFAULT_PLATFORM};
use crate::{error::AppError, state::AppState};

/// `POST /api/analytics/action` — record a user action.
///
/// The action always enters the bounded recent-actions window; it is attached
/// to its session only while that session is active. The durable row goes
/// through the write buffer and shares the action id returned to the client.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn track_action(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ActionPayload>,
) -> Result<impl IntoResponse, AppError> {
    if !state.check_rate_limit(&client_ip(&headers)).await {
        return Err(AppError::RateLimited);
    }

    if let Some(rt) = payload.response_time {
        if !rt.is_finite() || rt < 0.0 {
            return Err(AppError::BadRequest(
                "response_time must be a non-negative number of seconds".to_string(),
            ));
        }
    }

    let platform = payload
        .platform
        .unwrap_or_else(|| DEFAULT_PLATFORM.to_string());

    let action_id = state
        .realtime
        .record_action(
            &payload.session_id,
            &payload.action_type,
            &platform,
            payload.metadata.clone(),
            payload.response_time,
        )
        .await;

    state
        .push_rows(vec![AnalyticsRow::Action(ActionRecord {
            id: action_id.clone(),
            session_id: payload.session_id,
            action_type: payload.action_type,
            platform,
            timestamp: Utc::now(),
            metadata: payload.metadata.map(|v| v.to_string()),
            response_time: payload.response_time,
        })])
        .await;

    Ok(Json(json!({ "status": "success", "action_id": action_id })))
}
