use std::time::Duration;

use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    pub buffer_flush_interval_ms: u64,
    pub buffer_max_size: usize,
    /// Window for the dashboard and pain-point aggregations.
    pub dashboard_window_days: u32,
    /// Upper bound on the `days` query parameter of journey/export requests.
    pub export_max_days: u32,
    /// Disables the per-IP ingest rate limiter. Intended for tests.
    pub rate_limit_disable: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, CoreError> {
        Ok(Self {
            port: std::env::var("PULSELYTICS_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|e| CoreError::InvalidConfig(format!("invalid port: {e}")))?,
            data_dir: std::env::var("PULSELYTICS_DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string()),
            duckdb_memory_limit: std::env::var("PULSELYTICS_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            buffer_flush_interval_ms: std::env::var("PULSELYTICS_FLUSH_INTERVAL_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(1000),
            buffer_max_size: std::env::var("PULSELYTICS_BUFFER_MAX")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .unwrap_or(500),
            dashboard_window_days: std::env::var("PULSELYTICS_DASHBOARD_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .unwrap_or(7),
            export_max_days: std::env::var("PULSELYTICS_EXPORT_MAX_DAYS")
                .unwrap_or_else(|_| "365".to_string())
                .parse()
                .unwrap_or(365),
            rate_limit_disable: std::env::var("PULSELYTICS_RATE_LIMIT_DISABLE")
                .map(|v| v == "true")
                .unwrap_or(false),
        })
    }

    pub fn buffer_flush_interval(&self) -> Duration {
        Duration::from_millis(self.buffer_flush_interval_ms)
    }
}
