use anyhow::Result;

use pulselytics_core::analytics::{
    ActionTypeRow, DashboardResult, FeatureStatRow, MetricTypeRow, PlatformUsageRow, SessionStats,
};

use crate::queries::window_cutoff;
use crate::DuckDbBackend;

/// Breakdown rows shown on the dashboard are capped at the ten most frequent
/// action types.
const ACTION_TYPE_LIMIT: i64 = 10;

impl DuckDbBackend {
    /// Fixed dashboard aggregations over the trailing `window_days` window.
    pub async fn get_dashboard(&self, window_days: u32) -> Result<DashboardResult> {
        let conn = self.conn.lock().await;
        let cutoff = window_cutoff(window_days);

        let session_stats = conn
            .prepare(
                r#"SELECT
                       COUNT(*),
                       CAST(COALESCE(AVG(duration_seconds), 0) AS DOUBLE),
                       CAST(COALESCE(AVG(actions_count), 0) AS DOUBLE),
                       COUNT(DISTINCT user_id)
                   FROM user_sessions
                   WHERE start_time >= ?1"#,
            )?
            .query_row(duckdb::params![cutoff], |row| {
                Ok(SessionStats {
                    total_sessions: row.get(0)?,
                    avg_duration_seconds: row.get(1)?,
                    avg_actions: row.get(2)?,
                    unique_users: row.get(3)?,
                })
            })?;

        let mut stmt = conn.prepare(
            r#"SELECT platform, COUNT(*)
               FROM user_sessions
               WHERE start_time >= ?1
               GROUP BY platform
               ORDER BY 2 DESC"#,
        )?;
        let rows = stmt.query_map(duckdb::params![cutoff], |row| {
            Ok(PlatformUsageRow {
                platform: row.get(0)?,
                count: row.get(1)?,
            })
        })?;
        let mut platform_usage = Vec::new();
        for row in rows {
            platform_usage.push(row?);
        }

        let mut stmt = conn.prepare(&format!(
            r#"SELECT action_type, COUNT(*)
               FROM user_actions
               WHERE occurred_at >= ?1
               GROUP BY action_type
               ORDER BY 2 DESC
               LIMIT {ACTION_TYPE_LIMIT}"#
        ))?;
        let rows = stmt.query_map(duckdb::params![cutoff], |row| {
            Ok(ActionTypeRow {
                action_type: row.get(0)?,
                count: row.get(1)?,
            })
        })?;
        let mut action_types = Vec::new();
        for row in rows {
            action_types.push(row?);
        }

        let mut stmt = conn.prepare(
            r#"SELECT metric_type, CAST(AVG(value) AS DOUBLE), COUNT(*)
               FROM performance_metrics
               WHERE occurred_at >= ?1
               GROUP BY metric_type
               ORDER BY metric_type"#,
        )?;
        let rows = stmt.query_map(duckdb::params![cutoff], |row| {
            Ok(MetricTypeRow {
                metric_type: row.get(0)?,
                avg_value: row.get(1)?,
                count: row.get(2)?,
            })
        })?;
        let mut performance_stats = Vec::new();
        for row in rows {
            performance_stats.push(row?);
        }

        let mut stmt = conn.prepare(
            r#"SELECT feature_name, CAST(SUM(usage_count) AS BIGINT)
               FROM feature_usage
               WHERE occurred_at >= ?1
               GROUP BY feature_name
               ORDER BY 2 DESC"#,
        )?;
        let rows = stmt.query_map(duckdb::params![cutoff], |row| {
            Ok(FeatureStatRow {
                feature_name: row.get(0)?,
                total_usage: row.get(1)?,
            })
        })?;
        let mut feature_stats = Vec::new();
        for row in rows {
            feature_stats.push(row?);
        }

        Ok(DashboardResult {
            session_stats,
            platform_usage,
            action_types,
            performance_stats,
            feature_stats,
        })
    }
}
