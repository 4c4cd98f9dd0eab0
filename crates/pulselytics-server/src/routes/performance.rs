use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use pulselytics_core::event::{AnalyticsRow, MetricPayload, MetricRecord};

use crate::routes::client_ip;
use crate::{error::AppError, state::AppState};

/// `POST /api/analytics/performance` — record a performance metric sample.
///
/// The sample enters the per-type rolling window in the real-time view and
/// the write buffer for durable storage.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn track_metric(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<MetricPayload>,
) -> Result<impl IntoResponse, AppError> {
    if !state.check_rate_limit(&client_ip(&headers)).await {
        return Err(AppError::RateLimited);
    }

    state
        .realtime
        .record_metric(&payload.metric_type, payload.value, payload.metadata.clone())
        .await;

    state
        .push_rows(vec![AnalyticsRow::Metric(MetricRecord {
            id: uuid::Uuid::new_v4().to_string(),
            metric_type: payload.metric_type,
            value: payload.value,
            timestamp: Utc::now(),
            metadata: payload.metadata.map(|v| v.to_string()),
        })])
        .await;

    Ok(Json(json!({ "status": "success" })))
}
