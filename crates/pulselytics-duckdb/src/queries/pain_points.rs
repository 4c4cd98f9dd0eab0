use anyhow::Result;

use pulselytics_core::analytics::{
    LowEngagementRow, PainPointsResult, ShortSessionRow, SlowActionRow,
};

use crate::queries::window_cutoff;
use crate::DuckDbBackend;

/// An action slower than this (seconds) counts as a slow action.
const SLOW_ACTION_THRESHOLD_SECS: f64 = 2.0;

/// Sessions with fewer actions than this count as low engagement.
const LOW_ENGAGEMENT_MAX_ACTIONS: i64 = 3;

/// Sessions shorter than this (seconds) count as short sessions.
const SHORT_SESSION_MAX_SECS: f64 = 30.0;

const SLOW_ACTION_LIMIT: i64 = 10;

impl DuckDbBackend {
    /// UI/UX pain-point indicators over the trailing window: slow actions,
    /// low-engagement platforms, and short sessions.
    pub async fn get_pain_points(&self, window_days: u32) -> Result<PainPointsResult> {
        let conn = self.conn.lock().await;
        let cutoff = window_cutoff(window_days);

        let mut stmt = conn.prepare(&format!(
            r#"SELECT action_type, platform,
                      CAST(AVG(response_time) AS DOUBLE), COUNT(*)
               FROM user_actions
               WHERE response_time > ?2 AND occurred_at >= ?1
               GROUP BY action_type, platform
               ORDER BY 3 DESC
               LIMIT {SLOW_ACTION_LIMIT}"#
        ))?;
        let rows = stmt.query_map(
            duckdb::params![cutoff, SLOW_ACTION_THRESHOLD_SECS],
            |row| {
                Ok(SlowActionRow {
                    action_type: row.get(0)?,
                    platform: row.get(1)?,
                    avg_response_time: row.get(2)?,
                    count: row.get(3)?,
                })
            },
        )?;
        let mut slow_actions = Vec::new();
        for row in rows {
            slow_actions.push(row?);
        }

        // Sessions with low action counts (potential drop-offs).
        let mut stmt = conn.prepare(
            r#"SELECT platform, CAST(AVG(actions_count) AS DOUBLE), COUNT(*)
               FROM user_sessions
               WHERE actions_count < ?2 AND start_time >= ?1
               GROUP BY platform
               ORDER BY 2 ASC"#,
        )?;
        let rows = stmt.query_map(
            duckdb::params![cutoff, LOW_ENGAGEMENT_MAX_ACTIONS],
            |row| {
                Ok(LowEngagementRow {
                    platform: row.get(0)?,
                    avg_actions: row.get(1)?,
                    session_count: row.get(2)?,
                })
            },
        )?;
        let mut low_engagement = Vec::new();
        for row in rows {
            low_engagement.push(row?);
        }

        // Short sessions (potential usability issues). Sessions that were
        // never ended have NULL duration and are excluded by the comparison.
        let mut stmt = conn.prepare(
            r#"SELECT platform, CAST(AVG(duration_seconds) AS DOUBLE), COUNT(*)
               FROM user_sessions
               WHERE duration_seconds < ?2 AND start_time >= ?1
               GROUP BY platform
               ORDER BY 2 ASC"#,
        )?;
        let rows = stmt.query_map(duckdb::params![cutoff, SHORT_SESSION_MAX_SECS], |row| {
            Ok(ShortSessionRow {
                platform: row.get(0)?,
                avg_duration_seconds: row.get(1)?,
                session_count: row.get(2)?,
            })
        })?;
        let mut short_sessions = Vec::new();
        for row in rows {
            short_sessions.push(row?);
        }

        Ok(PainPointsResult {
            slow_actions,
            low_engagement,
            short_sessions,
        })
    }
}
