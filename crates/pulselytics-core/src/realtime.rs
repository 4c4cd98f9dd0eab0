//! In-memory real-time view of recent activity.
//!
//! All state lives behind a single `tokio::sync::Mutex` so every mutation and
//! the snapshot read are mutually exclusive: a reader never observes a
//! half-applied update. No operation holds the lock across an await point —
//! each critical section is a short, bounded, in-memory update.
//!
//! This view is volatile: it is rebuilt empty on restart. DuckDB holds the
//! durable record, and the two are decoupled — a failed DB write never rolls
//! back the in-memory state.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

/// Capacity of the rolling recent-actions window. Inserting into a full
/// window evicts exactly the oldest action.
pub const RECENT_ACTIONS_CAPACITY: usize = 1000;

/// Per-metric-type sample window capacity. Eviction is independent per type.
pub const METRIC_WINDOW_CAPACITY: usize = 100;

/// Trailing samples per metric type included in a snapshot.
const SNAPSHOT_SAMPLES: usize = 10;

/// A single user-triggered action, retained in the recent-actions window and
/// (when its session is active) in the session's action list. Immutable once
/// recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveAction {
    pub id: String,
    pub session_id: String,
    pub action_type: String,
    pub platform: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
    /// Seconds. Validated non-negative by the HTTP layer.
    pub response_time: Option<f64>,
}

/// One timestamped observation of a named performance metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
}

/// Tracked state of an active session. `user_id` and `platform` are carried
/// for parity with the durable row; only timing and the action list feed the
/// end-session computation.
#[derive(Debug, Clone)]
#[allow(dead_code)]
struct LiveSession {
    user_id: String,
    platform: String,
    start_time: DateTime<Utc>,
    actions: Vec<LiveAction>,
}

/// Computed result of ending a session that was present in the active set.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEnd {
    pub duration_seconds: f64,
    pub actions_count: usize,
}

/// Point-in-time deep copy of the aggregator state. Later mutations to the
/// aggregator never alter a snapshot that has already been returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealTimeStats {
    pub active_sessions: usize,
    pub recent_actions_count: usize,
    pub feature_usage: HashMap<String, u64>,
    /// Most recent [`SNAPSHOT_SAMPLES`] samples per tracked metric type, in
    /// chronological order.
    pub performance_metrics: HashMap<String, Vec<MetricSample>>,
}

#[derive(Debug, Default)]
struct RealTimeInner {
    active_sessions: HashMap<String, LiveSession>,
    recent_actions: VecDeque<LiveAction>,
    metric_windows: HashMap<String, VecDeque<MetricSample>>,
    feature_usage: HashMap<String, u64>,
}

/// Thread-safe, memory-bounded aggregator shared across request handlers.
///
/// Owned by `AppState` and constructed once at startup; handlers reach it
/// through `Arc<AppState>`.
#[derive(Debug, Default)]
pub struct RealTimeAnalytics {
    inner: Mutex<RealTimeInner>,
}

impl RealTimeAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `session_id` as active. A re-start with an id that is already
    /// active overwrites the previous entry, discarding its accumulated
    /// actions and timing.
    pub async fn start_session(&self, session_id: &str, user_id: &str, platform: &str) {
        let mut inner = self.inner.lock().await;
        inner.active_sessions.insert(
            session_id.to_string(),
            LiveSession {
                user_id: user_id.to_string(),
                platform: platform.to_string(),
                start_time: Utc::now(),
                actions: Vec::new(),
            },
        );
    }

    /// Remove `session_id` from the active set and report its duration and
    /// action count. `None` when the id is not active — a normal outcome, not
    /// an error (callers updating durable storage branch on it).
    pub async fn end_session(&self, session_id: &str) -> Option<SessionEnd> {
        let mut inner = self.inner.lock().await;
        let session = inner.active_sessions.remove(session_id)?;
        let duration = Utc::now() - session.start_time;
        Some(SessionEnd {
            duration_seconds: duration.num_milliseconds() as f64 / 1000.0,
            actions_count: session.actions.len(),
        })
    }

    /// Record an action into the recent-actions window, evicting the oldest
    /// entry when the window is full. If `session_id` names an active session
    /// the action is also appended to that session's list; an unknown session
    /// id skips that half silently (no session is created). Returns the new
    /// action id for correlation by the caller.
    pub async fn record_action(
        &self,
        session_id: &str,
        action_type: &str,
        platform: &str,
        metadata: Option<serde_json::Value>,
        response_time: Option<f64>,
    ) -> String {
        let action = LiveAction {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            action_type: action_type.to_string(),
            platform: platform.to_string(),
            timestamp: Utc::now(),
            metadata,
            response_time,
        };
        let id = action.id.clone();

        let mut inner = self.inner.lock().await;
        if inner.recent_actions.len() == RECENT_ACTIONS_CAPACITY {
            inner.recent_actions.pop_front();
        }
        inner.recent_actions.push_back(action.clone());

        if let Some(session) = inner.active_sessions.get_mut(session_id) {
            session.actions.push(action);
        }

        id
    }

    /// Append a sample to the window for `metric_type`, creating the window
    /// on first use and evicting that type's oldest sample at capacity.
    pub async fn record_metric(
        &self,
        metric_type: &str,
        value: f64,
        metadata: Option<serde_json::Value>,
    ) {
        let sample = MetricSample {
            value,
            timestamp: Utc::now(),
            metadata,
        };

        let mut inner = self.inner.lock().await;
        let window = inner
            .metric_windows
            .entry(metric_type.to_string())
            .or_default();
        if window.len() == METRIC_WINDOW_CAPACITY {
            window.pop_front();
        }
        window.push_back(sample);
    }

    /// Increment the process-lifetime counter for `feature_name` by one.
    /// The counter is global: `user_id` is persisted by the durable store but
    /// does not partition the in-memory count.
    pub async fn record_feature_usage(&self, feature_name: &str, _user_id: &str) {
        let mut inner = self.inner.lock().await;
        *inner
            .feature_usage
            .entry(feature_name.to_string())
            .or_insert(0) += 1;
    }

    /// Take a deep, independent copy of the current state, atomically with
    /// respect to all mutating operations.
    pub async fn snapshot(&self) -> RealTimeStats {
        let inner = self.inner.lock().await;
        RealTimeStats {
            active_sessions: inner.active_sessions.len(),
            recent_actions_count: inner.recent_actions.len(),
            feature_usage: inner.feature_usage.clone(),
            performance_metrics: inner
                .metric_windows
                .iter()
                .map(|(metric, window)| {
                    let skip = window.len().saturating_sub(SNAPSHOT_SAMPLES);
                    (
                        metric.clone(),
                        window.iter().skip(skip).cloned().collect::<Vec<_>>(),
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn recent_actions_window_holds_most_recent_thousand() {
        let rt = RealTimeAnalytics::new();
        let mut ids = Vec::new();
        for i in 0..1005 {
            let id = rt
                .record_action("s1", &format!("act_{i}"), "web", None, None)
                .await;
            ids.push(id);
        }

        let inner = rt.inner.lock().await;
        assert_eq!(inner.recent_actions.len(), RECENT_ACTIONS_CAPACITY);
        // Oldest five evicted; the window starts at action 5 and ends at 1004.
        assert_eq!(inner.recent_actions[0].action_type, "act_5");
        assert_eq!(inner.recent_actions[0].id, ids[5]);
        assert_eq!(
            inner.recent_actions[RECENT_ACTIONS_CAPACITY - 1].action_type,
            "act_1004"
        );
    }

    #[tokio::test]
    async fn window_length_tracks_calls_below_capacity() {
        let rt = RealTimeAnalytics::new();
        for _ in 0..7 {
            rt.record_action("s1", "click", "web", None, None).await;
        }
        assert_eq!(rt.snapshot().await.recent_actions_count, 7);
    }

    #[tokio::test]
    async fn metric_windows_evict_independently_per_type() {
        let rt = RealTimeAnalytics::new();
        for i in 0..120 {
            rt.record_metric("api_latency", i as f64, None).await;
        }
        for i in 0..5 {
            rt.record_metric("render_time", i as f64, None).await;
        }

        let inner = rt.inner.lock().await;
        let latency = &inner.metric_windows["api_latency"];
        assert_eq!(latency.len(), METRIC_WINDOW_CAPACITY);
        // Samples 0..20 evicted; the window holds 20..120 in order.
        assert_eq!(latency[0].value, 20.0);
        assert_eq!(latency[METRIC_WINDOW_CAPACITY - 1].value, 119.0);
        assert_eq!(inner.metric_windows["render_time"].len(), 5);
    }

    #[tokio::test]
    async fn snapshot_reports_last_ten_samples_in_chronological_order() {
        let rt = RealTimeAnalytics::new();
        for i in 0..25 {
            rt.record_metric("api_latency", i as f64, None).await;
        }
        rt.record_metric("render_time", 1.5, None).await;

        let stats = rt.snapshot().await;
        let latency = &stats.performance_metrics["api_latency"];
        assert_eq!(latency.len(), 10);
        assert_eq!(latency[0].value, 15.0);
        assert_eq!(latency[9].value, 24.0);
        // A type with fewer than ten samples reports all of them.
        assert_eq!(stats.performance_metrics["render_time"].len(), 1);
    }

    #[tokio::test]
    async fn session_lifecycle_counts_actions_recorded_in_between() {
        let rt = RealTimeAnalytics::new();
        rt.start_session("s1", "u1", "web").await;
        assert_eq!(rt.snapshot().await.active_sessions, 1);

        for _ in 0..3 {
            rt.record_action("s1", "click", "web", None, None).await;
        }
        // Actions for other sessions do not count against s1.
        rt.record_action("s2", "click", "web", None, None).await;

        let end = rt.end_session("s1").await;
        let end = end.unwrap();
        assert_eq!(end.actions_count, 3);
        assert!(end.duration_seconds >= 0.0);
        assert_eq!(rt.snapshot().await.active_sessions, 0);
    }

    #[tokio::test]
    async fn ending_unknown_session_is_a_no_op() {
        let rt = RealTimeAnalytics::new();
        rt.start_session("s1", "u1", "web").await;
        rt.record_action("s1", "click", "web", None, None).await;
        let before = rt.snapshot().await;

        assert!(rt.end_session("nonexistent").await.is_none());
        assert_eq!(rt.snapshot().await, before);
    }

    #[tokio::test]
    async fn restarting_an_active_session_discards_its_actions() {
        let rt = RealTimeAnalytics::new();
        rt.start_session("s1", "u1", "web").await;
        rt.record_action("s1", "click", "web", None, None).await;

        rt.start_session("s1", "u1", "web").await;
        assert_eq!(rt.snapshot().await.active_sessions, 1);
        let end = rt.end_session("s1").await.unwrap();
        assert_eq!(end.actions_count, 0);
    }

    #[tokio::test]
    async fn action_for_unknown_session_lands_only_in_the_window() {
        let rt = RealTimeAnalytics::new();
        rt.record_action("ghost", "click", "web", None, None).await;

        let stats = rt.snapshot().await;
        assert_eq!(stats.active_sessions, 0);
        assert_eq!(stats.recent_actions_count, 1);
    }

    #[tokio::test]
    async fn feature_counters_are_independent_and_exact() {
        let rt = RealTimeAnalytics::new();
        for _ in 0..8 {
            rt.record_feature_usage("export", "u1").await;
        }
        for _ in 0..3 {
            rt.record_feature_usage("search", "u2").await;
        }

        let stats = rt.snapshot().await;
        assert_eq!(stats.feature_usage["export"], 8);
        assert_eq!(stats.feature_usage["search"], 3);
    }

    #[tokio::test]
    async fn snapshot_is_isolated_from_later_mutations() {
        let rt = RealTimeAnalytics::new();
        rt.start_session("s1", "u1", "web").await;
        rt.record_metric("api_latency", 1.0, None).await;
        rt.record_feature_usage("export", "u1").await;

        let first = rt.snapshot().await;
        let second = rt.snapshot().await;
        assert_eq!(first, second);

        rt.record_feature_usage("export", "u1").await;
        rt.record_metric("api_latency", 2.0, None).await;
        rt.end_session("s1").await;

        // The earlier snapshot still shows the state it copied.
        assert_eq!(first.feature_usage["export"], 1);
        assert_eq!(first.performance_metrics["api_latency"].len(), 1);
        assert_eq!(first.active_sessions, 1);
    }

    #[tokio::test]
    async fn concurrent_writers_never_exceed_bounds_or_lose_increments() {
        const TASKS: usize = 8;
        const ITERS: usize = 50;

        let rt = Arc::new(RealTimeAnalytics::new());
        let mut handles = Vec::new();
        for t in 0..TASKS {
            let rt = Arc::clone(&rt);
            handles.push(tokio::spawn(async move {
                for i in 0..ITERS {
                    let sid = format!("s{t}_{i}");
                    rt.start_session(&sid, "u", "web").await;
                    rt.record_action(&sid, "click", "web", None, Some(0.1)).await;
                    rt.record_metric("api_latency", i as f64, None).await;
                    rt.record_feature_usage("export", "u").await;
                    rt.end_session(&sid).await;
                    // Interleave reads with the writers.
                    let stats = rt.snapshot().await;
                    assert!(stats.recent_actions_count <= RECENT_ACTIONS_CAPACITY);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = rt.snapshot().await;
        assert_eq!(stats.active_sessions, 0);
        assert_eq!(stats.feature_usage["export"], (TASKS * ITERS) as u64);
        assert_eq!(
            stats.recent_actions_count,
            (TASKS * ITERS).min(RECENT_ACTIONS_CAPACITY)
        );
        let inner = rt.inner.lock().await;
        assert!(inner.metric_windows["api_latency"].len() <= METRIC_WINDOW_CAPACITY);
    }
}
