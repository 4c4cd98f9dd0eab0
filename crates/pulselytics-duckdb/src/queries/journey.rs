use anyhow::Result;

use pulselytics_core::analytics::{JourneyAction, JourneySession};

use crate::queries::window_cutoff;
use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Sessions for `user_id` in the trailing window, newest first, each with
    /// its action timeline in chronological order.
    pub async fn get_user_journey(
        &self,
        user_id: &str,
        window_days: u32,
    ) -> Result<Vec<JourneySession>> {
        let conn = self.conn.lock().await;
        let cutoff = window_cutoff(window_days);

        let mut stmt = conn.prepare(
            r#"SELECT
                   id, platform,
                   CAST(start_time AS VARCHAR),
                   CAST(end_time AS VARCHAR),
                   duration_seconds,
                   actions_count
               FROM user_sessions
               WHERE user_id = ?1 AND start_time >= ?2
               ORDER BY start_time DESC"#,
        )?;
        let rows = stmt.query_map(duckdb::params![user_id, cutoff], |row| {
            Ok(JourneySession {
                session_id: row.get(0)?,
                platform: row.get(1)?,
                start_time: row.get(2)?,
                end_time: row.get(3)?,
                duration_seconds: row.get(4)?,
                actions_count: row.get(5)?,
                actions: Vec::new(),
            })
        })?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }

        let mut action_stmt = conn.prepare(
            r#"SELECT action_type, platform, CAST(occurred_at AS VARCHAR), response_time
               FROM user_actions
               WHERE session_id = ?1
               ORDER BY occurred_at"#,
        )?;
        for session in &mut sessions {
            let rows = action_stmt.query_map(duckdb::params![session.session_id], |row| {
                Ok(JourneyAction {
                    action_type: row.get(0)?,
                    platform: row.get(1)?,
                    timestamp: row.get(2)?,
                    response_time: row.get(3)?,
                })
            })?;
            for row in rows {
                session.actions.push(row?);
            }
        }

        Ok(sessions)
    }
}
