/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup (idempotent).
///
/// `memory_limit` is passed at runtime from `Config.duckdb_memory_limit`
/// (env `PULSELYTICS_DUCKDB_MEMORY`, default `"1GB"`). Always set an explicit
/// limit — the DuckDB default (80% of system RAM) is not acceptable for a
/// server process. `SET threads = 2` bounds the background thread pool; safe
/// for single-writer embedded use.
///
/// Event timestamps live in `occurred_at` (`created_at` is the row insert
/// time). All window queries compare against `occurred_at` / `start_time`.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- USER SESSIONS
-- ===========================================
-- Inserted at session start with end fields NULL; end_time,
-- duration_seconds and actions_count are filled by complete_session()
-- when the client posts session/end. Sessions the client never ends keep
-- NULL end fields and actions_count 0.
CREATE TABLE IF NOT EXISTS user_sessions (
    id               VARCHAR PRIMARY KEY,
    user_id          VARCHAR NOT NULL,
    platform         VARCHAR NOT NULL,
    start_time       TIMESTAMP NOT NULL,
    end_time         TIMESTAMP,
    duration_seconds DOUBLE,
    actions_count    INTEGER NOT NULL DEFAULT 0,
    created_at       TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
-- Primary query pattern: rolling window over start_time
CREATE INDEX IF NOT EXISTS idx_sessions_start
    ON user_sessions(start_time DESC);
-- Accelerates the user-journey lookup
CREATE INDEX IF NOT EXISTS idx_sessions_user_start
    ON user_sessions(user_id, start_time DESC);
-- Accelerates platform breakdowns
CREATE INDEX IF NOT EXISTS idx_sessions_platform_start
    ON user_sessions(platform, start_time);

-- ===========================================
-- USER ACTIONS
-- ===========================================
CREATE TABLE IF NOT EXISTS user_actions (
    id            VARCHAR PRIMARY KEY,
    session_id    VARCHAR NOT NULL,
    action_type   VARCHAR NOT NULL,
    platform      VARCHAR NOT NULL,
    occurred_at   TIMESTAMP NOT NULL,
    metadata      VARCHAR,                 -- JSON string (nullable)
    response_time DOUBLE,                  -- seconds (nullable)
    created_at    TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
-- Accelerates the per-session timeline (user journey)
CREATE INDEX IF NOT EXISTS idx_actions_session_time
    ON user_actions(session_id, occurred_at);
-- Accelerates windowed breakdowns by action type
CREATE INDEX IF NOT EXISTS idx_actions_type_time
    ON user_actions(action_type, occurred_at);
CREATE INDEX IF NOT EXISTS idx_actions_time
    ON user_actions(occurred_at DESC);

-- ===========================================
-- PERFORMANCE METRICS
-- ===========================================
CREATE TABLE IF NOT EXISTS performance_metrics (
    id          VARCHAR PRIMARY KEY,
    metric_type VARCHAR NOT NULL,
    value       DOUBLE NOT NULL,
    occurred_at TIMESTAMP NOT NULL,
    metadata    VARCHAR,                   -- JSON string (nullable)
    created_at  TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_metrics_type_time
    ON performance_metrics(metric_type, occurred_at);

-- ===========================================
-- FEATURE USAGE
-- ===========================================
-- One row per recorded usage (usage_count is always 1 at insert time);
-- totals are SUMmed at query time. user_id is stored here even though the
-- in-memory counter is global.
CREATE TABLE IF NOT EXISTS feature_usage (
    id           VARCHAR PRIMARY KEY,
    feature_name VARCHAR NOT NULL,
    usage_count  INTEGER NOT NULL DEFAULT 1,
    user_id      VARCHAR NOT NULL,
    occurred_at  TIMESTAMP NOT NULL,
    created_at   TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_feature_usage_name_time
    ON feature_usage(feature_name, occurred_at);
"#
    )
}
