//! Durable analytics storage abstraction.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event::{AnalyticsRow, SessionRecord};

/// Aggregate session statistics for the dashboard window.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub total_sessions: i64,
    pub avg_duration_seconds: f64,
    pub avg_actions: f64,
    pub unique_users: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformUsageRow {
    pub platform: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionTypeRow {
    pub action_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricTypeRow {
    pub metric_type: String,
    pub avg_value: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureStatRow {
    pub feature_name: String,
    pub total_usage: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResult {
    pub session_stats: SessionStats,
    pub platform_usage: Vec<PlatformUsageRow>,
    pub action_types: Vec<ActionTypeRow>,
    pub performance_stats: Vec<MetricTypeRow>,
    pub feature_stats: Vec<FeatureStatRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JourneyAction {
    pub action_type: String,
    pub platform: String,
    pub timestamp: String,
    pub response_time: Option<f64>,
}

/// One session in a user's journey, with its ordered action timeline.
#[derive(Debug, Clone, Serialize)]
pub struct JourneySession {
    pub session_id: String,
    pub platform: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration_seconds: Option<f64>,
    pub actions_count: i64,
    pub actions: Vec<JourneyAction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlowActionRow {
    pub action_type: String,
    pub platform: String,
    pub avg_response_time: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LowEngagementRow {
    pub platform: String,
    pub avg_actions: f64,
    pub session_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShortSessionRow {
    pub platform: String,
    pub avg_duration_seconds: f64,
    pub session_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PainPointsResult {
    pub slow_actions: Vec<SlowActionRow>,
    pub low_engagement: Vec<LowEngagementRow>,
    pub short_sessions: Vec<ShortSessionRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub total_sessions: i64,
    pub unique_users: i64,
    pub avg_session_duration: f64,
    pub total_actions: i64,
    pub avg_actions_per_session: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformPerformanceRow {
    pub platform: String,
    pub sessions: i64,
    pub avg_duration: f64,
    pub avg_actions: f64,
    pub unique_users: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyMetricRow {
    pub date: String,
    pub sessions: i64,
    pub unique_users: i64,
    pub avg_duration: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub summary: ExportSummary,
    pub platform_performance: Vec<PlatformPerformanceRow>,
    pub daily_metrics: Vec<DailyMetricRow>,
}

/// Storage interface for the durable analytics record.
///
/// Self-hosted mode uses the DuckDB implementation in `pulselytics-duckdb`;
/// route handlers depend only on this trait. Store failures are independent
/// of the in-memory real-time view — they surface as server errors without
/// touching aggregator state.
#[async_trait::async_trait]
pub trait AnalyticsStore: Send + Sync + 'static {
    /// Insert the session row at start time (end fields NULL).
    async fn insert_session(&self, session: &SessionRecord) -> anyhow::Result<()>;

    /// Fill the end fields of a session row. Called only when the aggregator
    /// reported the session as active.
    async fn complete_session(
        &self,
        session_id: &str,
        ended_at: DateTime<Utc>,
        duration_seconds: f64,
        actions_count: usize,
    ) -> anyhow::Result<()>;

    /// Insert a batch of buffered rows in a single transaction.
    async fn insert_rows(&self, rows: &[AnalyticsRow]) -> anyhow::Result<()>;

    async fn get_dashboard(&self, window_days: u32) -> anyhow::Result<DashboardResult>;

    async fn get_user_journey(
        &self,
        user_id: &str,
        window_days: u32,
    ) -> anyhow::Result<Vec<JourneySession>>;

    async fn get_pain_points(&self, window_days: u32) -> anyhow::Result<PainPointsResult>;

    async fn get_export_summary(&self, window_days: u32) -> anyhow::Result<ExportResult>;

    /// Lightweight liveness check for the health endpoint.
    async fn ping(&self) -> anyhow::Result<()>;
}
