use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{error, info};

use pulselytics_core::{
    analytics::AnalyticsStore, config::Config, event::AnalyticsRow, realtime::RealTimeAnalytics,
};
use pulselytics_duckdb::DuckDbBackend;

/// Ingest routes allow 60 requests per IP per 60-second window.
const RATE_LIMIT_MAX_REQUESTS: usize = 60;
const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// All fields are safe to clone cheaply — heavy resources are wrapped in
/// `Arc` or `Arc<Mutex<_>>`.
pub struct AppState {
    /// The concrete DuckDB backend. Kept alongside the trait object so
    /// integration tests can reach `conn_for_test`.
    pub db: Arc<DuckDbBackend>,

    /// The durable store as seen by route handlers.
    pub analytics: Arc<dyn AnalyticsStore>,

    /// In-memory real-time view. Volatile; rebuilt empty on restart.
    pub realtime: RealTimeAnalytics,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// In-memory buffer of durable rows (actions, metric samples, feature
    /// usage) awaiting the next flush.
    ///
    /// Lock, drain, release — then flush to DB. The lock is held only long
    /// enough to `std::mem::take` the buffer so the DB write does not block
    /// incoming ingest requests.
    pub buffer: Arc<Mutex<Vec<AnalyticsRow>>>,

    /// Per-IP sliding-window rate limiter for the ingest routes.
    ///
    /// Key: IP address string. Value: deque of request timestamps within the
    /// last 60 seconds.
    rate_limiter: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
}

impl AppState {
    /// Construct a new `AppState` wrapping the given backend and config.
    pub fn new(db: DuckDbBackend, config: Config) -> Self {
        let db = Arc::new(db);
        Self {
            analytics: Arc::clone(&db) as Arc<dyn AnalyticsStore>,
            db,
            realtime: RealTimeAnalytics::new(),
            config: Arc::new(config),
            buffer: Arc::new(Mutex::new(Vec::new())),
            rate_limiter: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check whether `ip` is within the ingest rate limit.
    ///
    /// Returns `true` if the request should proceed, `false` if it should be
    /// rejected with 429. Slides the window on every call.
    pub async fn check_rate_limit(&self, ip: &str) -> bool {
        if self.config.rate_limit_disable {
            return true;
        }
        let mut map = self.rate_limiter.lock().await;
        let window = map.entry(ip.to_string()).or_default();
        let cutoff = Instant::now() - std::time::Duration::from_secs(RATE_LIMIT_WINDOW_SECS);
        // Drop timestamps older than the window.
        while window.front().is_some_and(|t| *t < cutoff) {
            window.pop_front();
        }
        if window.len() >= RATE_LIMIT_MAX_REQUESTS {
            return false;
        }
        window.push_back(Instant::now());
        true
    }

    /// Append `rows` to the durable-write buffer.
    ///
    /// If the buffer length reaches or exceeds `config.buffer_max_size` after
    /// the append, an immediate flush is triggered instead of waiting for the
    /// background timer.
    pub async fn push_rows(&self, rows: Vec<AnalyticsRow>) {
        let should_flush = {
            let mut buf = self.buffer.lock().await;
            buf.extend(rows);
            buf.len() >= self.config.buffer_max_size
        };

        if should_flush {
            self.flush_buffer().await;
        }
    }

    /// Drain the buffer and write all pending rows to DuckDB.
    ///
    /// The `Mutex` is held only for the `std::mem::take` so the ingest
    /// endpoints are not blocked while the DB write runs. A failed flush is
    /// logged and dropped — the durable record and the real-time view are
    /// decoupled, and the aggregator keeps serving either way.
    pub async fn flush_buffer(&self) {
        let batch: Vec<AnalyticsRow> = {
            let mut buf = self.buffer.lock().await;
            std::mem::take(&mut *buf)
        };

        if batch.is_empty() {
            return;
        }

        match self.analytics.insert_rows(&batch).await {
            Ok(()) => {
                info!(count = batch.len(), "Buffer flushed to DuckDB");
            }
            Err(e) => {
                error!(count = batch.len(), error = %e, "Buffer flush failed — rows lost");
            }
        }
    }

    /// Background loop: flush the buffer on a fixed interval.
    ///
    /// Spawned as a `tokio::spawn` task in `main.rs`. Runs until the process
    /// exits. Interval is read from `config.buffer_flush_interval_ms`.
    pub async fn run_buffer_flush_loop(self: Arc<Self>) {
        let interval = self.config.buffer_flush_interval();
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            self.flush_buffer().await;
        }
    }
}
