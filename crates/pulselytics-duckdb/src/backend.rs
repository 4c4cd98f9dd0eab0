use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use pulselytics_core::event::{AnalyticsRow, SessionRecord};

use crate::schema::init_sql;

/// A DuckDB backend for Pulselytics.
///
/// DuckDB is single-writer: concurrent reads are fine, but concurrent writes
/// cause contention. We wrap the connection in `Arc<Mutex<_>>` so the async
/// runtime serialises all writes through the buffer-flush task while still
/// allowing the struct to be cheaply cloned and shared across Axum handlers.
///
/// Memory and thread limits are enforced by [`init_sql`] at open time.
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`,
    /// read from `Config.duckdb_memory_limit` at the call site. Runs the
    /// schema init SQL so all tables and indexes exist.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2",
            path, memory_limit
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** DuckDB database.
    ///
    /// Intended for tests only — data is discarded when the struct is
    /// dropped. Uses a 1GB memory limit (tests are not memory-constrained).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert the durable session row at session start. End fields stay NULL
    /// until [`complete_session`](Self::complete_session).
    pub async fn insert_session(&self, session: &SessionRecord) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO user_sessions (id, user_id, platform, start_time, actions_count)
               VALUES (?1, ?2, ?3, ?4, 0)"#,
            duckdb::params![
                session.id,
                session.user_id,
                session.platform,
                session.start_time.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fill the end fields of a session row. A session id the client made up
    /// (or already ended) matches zero rows; that is not an error.
    pub async fn complete_session(
        &self,
        session_id: &str,
        ended_at: DateTime<Utc>,
        duration_seconds: f64,
        actions_count: usize,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"UPDATE user_sessions
               SET end_time = ?1, duration_seconds = ?2, actions_count = ?3
               WHERE id = ?4"#,
            duckdb::params![
                ended_at.to_rfc3339(),
                duration_seconds,
                actions_count as i64,
                session_id,
            ],
        )?;
        Ok(())
    }

    /// Insert a batch of buffered rows in a single transaction.
    ///
    /// Called by the buffer-flush background task. Wrapping the batch in one
    /// transaction gives atomicity and one fsync instead of N.
    ///
    /// Returns immediately (no-op) if `rows` is empty.
    pub async fn insert_rows(&self, rows: &[AnalyticsRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        for row in rows {
            match row {
                AnalyticsRow::Action(a) => {
                    tx.execute(
                        r#"INSERT INTO user_actions (
                            id, session_id, action_type, platform,
                            occurred_at, metadata, response_time
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
                        duckdb::params![
                            a.id,
                            a.session_id,
                            a.action_type,
                            a.platform,
                            a.timestamp.to_rfc3339(),
                            a.metadata,
                            a.response_time,
                        ],
                    )?;
                }
                AnalyticsRow::Metric(m) => {
                    tx.execute(
                        r#"INSERT INTO performance_metrics (
                            id, metric_type, value, occurred_at, metadata
                        ) VALUES (?1, ?2, ?3, ?4, ?5)"#,
                        duckdb::params![
                            m.id,
                            m.metric_type,
                            m.value,
                            m.timestamp.to_rfc3339(),
                            m.metadata,
                        ],
                    )?;
                }
                AnalyticsRow::FeatureUsage(f) => {
                    tx.execute(
                        r#"INSERT INTO feature_usage (
                            id, feature_name, usage_count, user_id, occurred_at
                        ) VALUES (?1, ?2, 1, ?3, ?4)"#,
                        duckdb::params![
                            f.id,
                            f.feature_name,
                            f.user_id,
                            f.timestamp.to_rfc3339(),
                        ],
                    )?;
                }
            }
        }

        tx.commit()?;
        info!("Inserted {} analytics rows into DuckDB", rows.len());
        Ok(())
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    ///
    /// Called by the `/health` endpoint. Returns an error if the connection
    /// is unavailable (file locked, disk full, etc.).
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the DuckDB connection lock for direct queries.
    ///
    /// Intended for integration tests that need to verify stored data.
    /// Production code should use the typed methods above.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
