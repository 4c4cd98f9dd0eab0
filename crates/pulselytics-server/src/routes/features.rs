use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use pulselytics_core::event::{AnalyticsRow, FeatureUsagePayload, FeatureUsageRecord};

use crate::routes::{client_ip, DEFAULT_USER_ID};
use crate::{error::AppError, state::AppState};

/// `POST /api/analytics/feature-usage` — count one use of a named feature.
///
/// The in-memory counter is global per feature; the durable row additionally
/// records which user triggered it.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn track_feature_usage(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<FeatureUsagePayload>,
) -> Result<impl IntoResponse, AppError> {
    if !state.check_rate_limit(&client_ip(&headers)).await {
        return Err(AppError::RateLimited);
    }

    let user_id = payload
        .user_id
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string());

    state
        .realtime
        .record_feature_usage(&payload.feature_name, &user_id)
        .await;

    state
        .push_rows(vec![AnalyticsRow::FeatureUsage(FeatureUsageRecord {
            id: uuid::Uuid::new_v4().to_string(),
            feature_name: payload.feature_name,
            user_id,
            timestamp: Utc::now(),
        })])
        .await;

    Ok(Json(json!({ "status": "success" })))
}
