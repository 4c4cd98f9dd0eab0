use chrono::{DateTime, Duration, Utc};

use pulselytics_core::analytics::AnalyticsStore;
use pulselytics_core::event::{
    ActionRecord, AnalyticsRow, FeatureUsageRecord, MetricRecord, SessionRecord,
};
use pulselytics_duckdb::DuckDbBackend;

fn ts(days_ago: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days_ago)
}

fn session(id: &str, user_id: &str, platform: &str, days_ago: i64) -> SessionRecord {
    SessionRecord {
        id: id.to_string(),
        user_id: user_id.to_string(),
        platform: platform.to_string(),
        start_time: ts(days_ago),
    }
}

fn action(session_id: &str, action_type: &str, when: DateTime<Utc>, response_time: Option<f64>) -> AnalyticsRow {
    AnalyticsRow::Action(ActionRecord {
        id: uuid::Uuid::new_v4().to_string(),
        session_id: session_id.to_string(),
        action_type: action_type.to_string(),
        platform: "web".to_string(),
        timestamp: when,
        metadata: None,
        response_time,
    })
}

fn metric(metric_type: &str, value: f64, days_ago: i64) -> AnalyticsRow {
    AnalyticsRow::Metric(MetricRecord {
        id: uuid::Uuid::new_v4().to_string(),
        metric_type: metric_type.to_string(),
        value,
        timestamp: ts(days_ago),
        metadata: None,
    })
}

fn feature(feature_name: &str, user_id: &str, days_ago: i64) -> AnalyticsRow {
    AnalyticsRow::FeatureUsage(FeatureUsageRecord {
        id: uuid::Uuid::new_v4().to_string(),
        feature_name: feature_name.to_string(),
        user_id: user_id.to_string(),
        timestamp: ts(days_ago),
    })
}

// ============================================================
// Dashboard aggregations
// ============================================================

#[tokio::test]
async fn dashboard_aggregates_only_sessions_in_window() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");

    db.insert_session(&session("s1", "u1", "web", 0))
        .await
        .expect("insert s1");
    db.insert_session(&session("s2", "u1", "ios", 1))
        .await
        .expect("insert s2");
    // Outside the 7-day window.
    db.insert_session(&session("s3", "u2", "web", 30))
        .await
        .expect("insert s3");

    db.complete_session("s1", Utc::now(), 60.0, 4)
        .await
        .expect("complete s1");
    db.complete_session("s2", Utc::now(), 120.0, 2)
        .await
        .expect("complete s2");

    let dash = db.get_dashboard(7).await.expect("dashboard");
    assert_eq!(dash.session_stats.total_sessions, 2);
    assert_eq!(dash.session_stats.unique_users, 1);
    assert!((dash.session_stats.avg_duration_seconds - 90.0).abs() < 1e-9);
    assert!((dash.session_stats.avg_actions - 3.0).abs() < 1e-9);

    let platforms: Vec<(String, i64)> = dash
        .platform_usage
        .iter()
        .map(|r| (r.platform.clone(), r.count))
        .collect();
    assert_eq!(platforms.len(), 2);
    assert!(platforms.contains(&("web".to_string(), 1)));
    assert!(platforms.contains(&("ios".to_string(), 1)));
}

#[tokio::test]
async fn dashboard_breaks_down_actions_metrics_and_features() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");

    let now = Utc::now();
    db.insert_rows(&[
        action("s1", "generate", now, None),
        action("s1", "generate", now, None),
        action("s1", "generate", now, None),
        action("s1", "save", now, None),
        // Outside the window; must not count.
        action("s1", "generate", ts(30), None),
        metric("api_latency", 1.0, 0),
        metric("api_latency", 3.0, 0),
        metric("render_time", 5.0, 0),
        feature("export", "u1", 0),
        feature("export", "u2", 0),
        feature("export", "u1", 0),
        feature("search", "u1", 0),
    ])
    .await
    .expect("insert rows");

    let dash = db.get_dashboard(7).await.expect("dashboard");

    assert_eq!(dash.action_types[0].action_type, "generate");
    assert_eq!(dash.action_types[0].count, 3);
    assert_eq!(dash.action_types[1].action_type, "save");
    assert_eq!(dash.action_types[1].count, 1);

    let latency = dash
        .performance_stats
        .iter()
        .find(|r| r.metric_type == "api_latency")
        .expect("api_latency row");
    assert!((latency.avg_value - 2.0).abs() < 1e-9);
    assert_eq!(latency.count, 2);

    assert_eq!(dash.feature_stats[0].feature_name, "export");
    assert_eq!(dash.feature_stats[0].total_usage, 3);
    assert_eq!(dash.feature_stats[1].feature_name, "search");
    assert_eq!(dash.feature_stats[1].total_usage, 1);
}

// ============================================================
// User journey
// ============================================================

#[tokio::test]
async fn journey_returns_sessions_newest_first_with_ordered_actions() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");

    db.insert_session(&session("s1", "u1", "web", 2))
        .await
        .expect("insert s1");
    db.insert_session(&session("s2", "u1", "ios", 1))
        .await
        .expect("insert s2");
    db.insert_session(&session("other", "u2", "web", 1))
        .await
        .expect("insert other");

    let base = Utc::now() - Duration::days(2);
    // Inserted out of chronological order; the query orders the timeline.
    db.insert_rows(&[
        action("s1", "save", base + Duration::seconds(20), None),
        action("s1", "open", base + Duration::seconds(5), None),
        action("other", "open", base, None),
    ])
    .await
    .expect("insert actions");

    let journey = db.get_user_journey("u1", 7).await.expect("journey");
    assert_eq!(journey.len(), 2);
    assert_eq!(journey[0].session_id, "s2");
    assert_eq!(journey[1].session_id, "s1");

    let timeline: Vec<&str> = journey[1]
        .actions
        .iter()
        .map(|a| a.action_type.as_str())
        .collect();
    assert_eq!(timeline, vec!["open", "save"]);
    assert!(journey[0].actions.is_empty());
}

#[tokio::test]
async fn journey_window_excludes_old_sessions() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    db.insert_session(&session("old", "u1", "web", 30))
        .await
        .expect("insert old");

    let journey = db.get_user_journey("u1", 7).await.expect("journey");
    assert!(journey.is_empty());
}

// ============================================================
// Pain points
// ============================================================

#[tokio::test]
async fn pain_points_apply_the_documented_thresholds() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");

    let now = Utc::now();
    db.insert_rows(&[
        // Above the 2.0s threshold.
        action("s1", "generate", now, Some(3.5)),
        action("s1", "generate", now, Some(2.5)),
        // At or below the threshold; excluded.
        action("s1", "open", now, Some(0.4)),
        action("s1", "scroll", now, None),
    ])
    .await
    .expect("insert actions");

    db.insert_session(&session("s1", "u1", "web", 0))
        .await
        .expect("insert s1");
    db.insert_session(&session("s2", "u2", "ios", 0))
        .await
        .expect("insert s2");
    // s1: engaged but short. s2: low engagement, normal length.
    db.complete_session("s1", Utc::now(), 10.0, 5)
        .await
        .expect("complete s1");
    db.complete_session("s2", Utc::now(), 300.0, 1)
        .await
        .expect("complete s2");

    let pain = db.get_pain_points(7).await.expect("pain points");

    assert_eq!(pain.slow_actions.len(), 1);
    assert_eq!(pain.slow_actions[0].action_type, "generate");
    assert_eq!(pain.slow_actions[0].count, 2);
    assert!((pain.slow_actions[0].avg_response_time - 3.0).abs() < 1e-9);

    assert_eq!(pain.low_engagement.len(), 1);
    assert_eq!(pain.low_engagement[0].platform, "ios");
    assert_eq!(pain.low_engagement[0].session_count, 1);

    assert_eq!(pain.short_sessions.len(), 1);
    assert_eq!(pain.short_sessions[0].platform, "web");
    assert!((pain.short_sessions[0].avg_duration_seconds - 10.0).abs() < 1e-9);
}

// ============================================================
// Export
// ============================================================

#[tokio::test]
async fn export_summary_platforms_and_daily_series() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");

    db.insert_session(&session("s1", "u1", "web", 0))
        .await
        .expect("insert s1");
    db.insert_session(&session("s2", "u2", "web", 1))
        .await
        .expect("insert s2");
    db.insert_session(&session("s3", "u1", "ios", 1))
        .await
        .expect("insert s3");

    db.complete_session("s1", Utc::now(), 100.0, 10)
        .await
        .expect("complete s1");
    db.complete_session("s2", Utc::now(), 50.0, 2)
        .await
        .expect("complete s2");

    let export = db.get_export_summary(30).await.expect("export");
    assert_eq!(export.summary.total_sessions, 3);
    assert_eq!(export.summary.unique_users, 2);
    assert_eq!(export.summary.total_actions, 12);
    assert!((export.summary.avg_session_duration - 75.0).abs() < 1e-9);
    assert!((export.summary.avg_actions_per_session - 4.0).abs() < 1e-9);

    let web = export
        .platform_performance
        .iter()
        .find(|r| r.platform == "web")
        .expect("web row");
    assert_eq!(web.sessions, 2);
    assert_eq!(web.unique_users, 2);

    // Two distinct start dates, oldest first.
    assert_eq!(export.daily_metrics.len(), 2);
    assert!(export.daily_metrics[0].date < export.daily_metrics[1].date);
    assert_eq!(export.daily_metrics[1].sessions, 1);
}

// ============================================================
// Misc backend behaviour
// ============================================================

#[tokio::test]
async fn completing_an_unknown_session_changes_nothing() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    db.complete_session("ghost", Utc::now(), 1.0, 1)
        .await
        .expect("complete unknown");

    let conn = db.conn_for_test().await;
    let count: i64 = conn
        .prepare("SELECT COUNT(*) FROM user_sessions")
        .expect("prepare")
        .query_row([], |row| row.get(0))
        .expect("count");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn insert_rows_with_empty_batch_is_a_noop() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    db.insert_rows(&[]).await.expect("empty batch");
}

#[tokio::test]
async fn ping_succeeds_on_an_open_database() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    AnalyticsStore::ping(&db).await.expect("ping");
}
