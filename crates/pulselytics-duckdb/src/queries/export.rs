use anyhow::Result;

use pulselytics_core::analytics::{
    DailyMetricRow, ExportResult, ExportSummary, PlatformPerformanceRow,
};

use crate::queries::window_cutoff;
use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Export aggregations over the trailing window: overall summary,
    /// per-platform performance, and the daily engagement series.
    pub async fn get_export_summary(&self, window_days: u32) -> Result<ExportResult> {
        let conn = self.conn.lock().await;
        let cutoff = window_cutoff(window_days);

        let summary = conn
            .prepare(
                r#"SELECT
                       COUNT(*),
                       COUNT(DISTINCT user_id),
                       CAST(COALESCE(AVG(duration_seconds), 0) AS DOUBLE),
                       CAST(COALESCE(SUM(actions_count), 0) AS BIGINT),
                       CAST(COALESCE(AVG(actions_count), 0) AS DOUBLE)
                   FROM user_sessions
                   WHERE start_time >= ?1"#,
            )?
            .query_row(duckdb::params![cutoff], |row| {
                Ok(ExportSummary {
                    total_sessions: row.get(0)?,
                    unique_users: row.get(1)?,
                    avg_session_duration: row.get(2)?,
                    total_actions: row.get(3)?,
                    avg_actions_per_session: row.get(4)?,
                })
            })?;

        let mut stmt = conn.prepare(
            r#"SELECT
                   platform,
                   COUNT(*),
                   CAST(COALESCE(AVG(duration_seconds), 0) AS DOUBLE),
                   CAST(COALESCE(AVG(actions_count), 0) AS DOUBLE),
                   COUNT(DISTINCT user_id)
               FROM user_sessions
               WHERE start_time >= ?1
               GROUP BY platform
               ORDER BY 2 DESC"#,
        )?;
        let rows = stmt.query_map(duckdb::params![cutoff], |row| {
            Ok(PlatformPerformanceRow {
                platform: row.get(0)?,
                sessions: row.get(1)?,
                avg_duration: row.get(2)?,
                avg_actions: row.get(3)?,
                unique_users: row.get(4)?,
            })
        })?;
        let mut platform_performance = Vec::new();
        for row in rows {
            platform_performance.push(row?);
        }

        let mut stmt = conn.prepare(
            r#"SELECT
                   CAST(CAST(start_time AS DATE) AS VARCHAR),
                   COUNT(*),
                   COUNT(DISTINCT user_id),
                   CAST(COALESCE(AVG(duration_seconds), 0) AS DOUBLE)
               FROM user_sessions
               WHERE start_time >= ?1
               GROUP BY 1
               ORDER BY 1"#,
        )?;
        let rows = stmt.query_map(duckdb::params![cutoff], |row| {
            Ok(DailyMetricRow {
                date: row.get(0)?,
                sessions: row.get(1)?,
                unique_users: row.get(2)?,
                avg_duration: row.get(3)?,
            })
        })?;
        let mut daily_metrics = Vec::new();
        for row in rows {
            daily_metrics.push(row?);
        }

        Ok(ExportResult {
            summary,
            platform_performance,
            daily_metrics,
        })
    }
}
