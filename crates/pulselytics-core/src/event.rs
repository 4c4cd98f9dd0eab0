use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Payload for POST /api/analytics/session/start. Missing fields get the
/// documented defaults at the HTTP layer: `user_id` → "anonymous",
/// `platform` → "unknown". The session id itself is generated server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionStartPayload {
    pub user_id: Option<String>,
    pub platform: Option<String>,
}

/// Payload for POST /api/analytics/session/end.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionEndPayload {
    pub session_id: String,
}

/// Payload for POST /api/analytics/action.
///
/// `session_id` may name a session that was never started or has already
/// ended; the action is still recorded, it just isn't attached to an active
/// session. `metadata` is an opaque JSON object, stringified before storage.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionPayload {
    pub session_id: String,
    pub action_type: String,
    pub platform: Option<String>,
    pub metadata: Option<serde_json::Value>,
    /// Seconds. Negative values are rejected with 400 at the HTTP layer.
    pub response_time: Option<f64>,
}

/// Payload for POST /api/analytics/performance.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricPayload {
    pub metric_type: String,
    pub value: f64,
    pub metadata: Option<serde_json::Value>,
}

/// Payload for POST /api/analytics/feature-usage.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureUsagePayload {
    pub feature_name: String,
    pub user_id: Option<String>,
}

/// Stored session — mirrors the `user_sessions` columns written at start
/// time. End fields are filled by `complete_session` when the session ends.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub platform: String,
    pub start_time: DateTime<Utc>,
}

/// Stored action — mirrors the `user_actions` columns.
#[derive(Debug, Clone)]
pub struct ActionRecord {
    pub id: String,
    pub session_id: String,
    pub action_type: String,
    pub platform: String,
    pub timestamp: DateTime<Utc>,
    /// Serialized JSON string. Clients send an object; the server stringifies
    /// it before storage.
    pub metadata: Option<String>,
    pub response_time: Option<f64>,
}

/// Stored performance sample — mirrors the `performance_metrics` columns.
#[derive(Debug, Clone)]
pub struct MetricRecord {
    pub id: String,
    pub metric_type: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<String>,
}

/// Stored feature-usage increment — mirrors the `feature_usage` columns.
/// One row per recorded usage; totals are summed at query time.
#[derive(Debug, Clone)]
pub struct FeatureUsageRecord {
    pub id: String,
    pub feature_name: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

/// A single entry in the durable-write buffer. Actions, metric samples, and
/// feature-usage rows share one buffer and one flush transaction.
#[derive(Debug, Clone)]
pub enum AnalyticsRow {
    Action(ActionRecord),
    Metric(MetricRecord),
    FeatureUsage(FeatureUsageRecord),
}
