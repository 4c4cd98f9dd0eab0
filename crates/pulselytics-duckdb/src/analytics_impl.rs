use async_trait::async_trait;
use chrono::{DateTime, Utc};

use pulselytics_core::analytics::{
    AnalyticsStore, DashboardResult, ExportResult, JourneySession, PainPointsResult,
};
use pulselytics_core::event::{AnalyticsRow, SessionRecord};

use crate::DuckDbBackend;

#[async_trait]
impl AnalyticsStore for DuckDbBackend {
    async fn insert_session(&self, session: &SessionRecord) -> anyhow::Result<()> {
        DuckDbBackend::insert_session(self, session).await
    }

    async fn complete_session(
        &self,
        session_id: &str,
        ended_at: DateTime<Utc>,
        duration_seconds: f64,
        actions_count: usize,
    ) -> anyhow::Result<()> {
        DuckDbBackend::complete_session(self, session_id, ended_at, duration_seconds, actions_count)
            .await
    }

    async fn insert_rows(&self, rows: &[AnalyticsRow]) -> anyhow::Result<()> {
        DuckDbBackend::insert_rows(self, rows).await
    }

    async fn get_dashboard(&self, window_days: u32) -> anyhow::Result<DashboardResult> {
        DuckDbBackend::get_dashboard(self, window_days).await
    }

    async fn get_user_journey(
        &self,
        user_id: &str,
        window_days: u32,
    ) -> anyhow::Result<Vec<JourneySession>> {
        DuckDbBackend::get_user_journey(self, user_id, window_days).await
    }

    async fn get_pain_points(&self, window_days: u32) -> anyhow::Result<PainPointsResult> {
        DuckDbBackend::get_pain_points(self, window_days).await
    }

    async fn get_export_summary(&self, window_days: u32) -> anyhow::Result<ExportResult> {
        DuckDbBackend::get_export_summary(self, window_days).await
    }

    async fn ping(&self) -> anyhow::Result<()> {
        DuckDbBackend::ping(self).await
    }
}
