use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use pulselytics_core::config::Config;
use pulselytics_duckdb::DuckDbBackend;
use pulselytics_server::app::build_app;
use pulselytics_server::state::AppState;

fn test_config() -> Config {
    Config {
        port: 0,
        data_dir: "/tmp/pulselytics-test".to_string(),
        duckdb_memory_limit: "1GB".to_string(),
        buffer_flush_interval_ms: 1000,
        buffer_max_size: 100,
        dashboard_window_days: 7,
        export_max_days: 365,
        rate_limit_disable: true,
    }
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

// ============================================================
// BDD: Health check returns 200 when DB is reachable
// ============================================================
#[tokio::test]
async fn test_health_returns_200_when_db_reachable() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let state = Arc::new(AppState::new(db, test_config()));
    let app = build_app(state);

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build request");

    let response = app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database_status"], "connected");
    assert_eq!(json["active_sessions"], 0);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["timestamp"].is_string());
}

// ============================================================
// BDD: Health reports the live active-session count
// ============================================================
#[tokio::test]
async fn test_health_reports_active_sessions() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let state = Arc::new(AppState::new(db, test_config()));
    state.realtime.start_session("s1", "u1", "web").await;
    let app = build_app(state);

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build request");

    let response = app.oneshot(request).await.expect("request");
    let json = json_body(response).await;
    assert_eq!(json["active_sessions"], 1);
}
