use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use pulselytics_core::event::{SessionEndPayload, SessionRecord, SessionStartPayload};

use crate::routes::{client_ip, DEFAULT_PLATFORM, DEFAULT_USER_ID};
use crate::{error::AppError, state::AppState};

/// `POST /api/analytics/session/start` — begin a tracked session.
///
/// The session id is generated server-side and returned to the client, which
/// echoes it on every subsequent action and on session/end. Missing fields
/// get defaults (`user_id` → "anonymous", `platform` → "unknown").
///
/// The session is registered in the real-time view and inserted into
/// `user_sessions` synchronously; a store failure is a 500 but does not
/// unwind the in-memory registration.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SessionStartPayload>,
) -> Result<impl IntoResponse, AppError> {
    if !state.check_rate_limit(&client_ip(&headers)).await {
        return Err(AppError::RateLimited);
    }

    let session_id = uuid::Uuid::new_v4().to_string();
    let user_id = payload
        .user_id
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string());
    let platform = payload
        .platform
        .unwrap_or_else(|| DEFAULT_PLATFORM.to_string());

    state
        .realtime
        .start_session(&session_id, &user_id, &platform)
        .await;

    state
        .analytics
        .insert_session(&SessionRecord {
            id: session_id.clone(),
            user_id,
            platform,
            start_time: Utc::now(),
        })
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(json!({ "session_id": session_id })))
}

/// `POST /api/analytics/session/end` — close a tracked session.
///
/// An unknown session id (never started, already ended, or lost to a server
/// restart) is a normal outcome: the response is still `success` and nothing
/// changes. When the session was active, the duration and action count
/// computed by the real-time view are written to its durable row.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SessionEndPayload>,
) -> Result<impl IntoResponse, AppError> {
    if !state.check_rate_limit(&client_ip(&headers)).await {
        return Err(AppError::RateLimited);
    }

    if let Some(end) = state.realtime.end_session(&payload.session_id).await {
        state
            .analytics
            .complete_session(
                &payload.session_id,
                Utc::now(),
                end.duration_seconds,
                end.actions_count,
            )
            .await
            .map_err(AppError::Internal)?;
    }

    Ok(Json(json!({ "status": "success" })))
}
