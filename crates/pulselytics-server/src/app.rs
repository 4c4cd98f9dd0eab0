use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer` — structured request/response logging via `tracing`.
/// 2. `CorsLayer` — permissive CORS: the tracking calls are issued from
///    browser clients on arbitrary origins.
///
/// Per-IP rate limiting on the ingest routes is enforced inside the handlers
/// via [`AppState::check_rate_limit`].
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/analytics/session/start",
            post(routes::sessions::start_session),
        )
        .route(
            "/api/analytics/session/end",
            post(routes::sessions::end_session),
        )
        .route("/api/analytics/action", post(routes::actions::track_action))
        .route(
            "/api/analytics/performance",
            post(routes::performance::track_metric),
        )
        .route(
            "/api/analytics/feature-usage",
            post(routes::features::track_feature_usage),
        )
        .route(
            "/api/analytics/dashboard",
            get(routes::dashboard::get_dashboard),
        )
        .route(
            "/api/analytics/realtime",
            get(routes::realtime::get_realtime),
        )
        .route(
            "/api/analytics/user-journey",
            get(routes::journey::get_user_journey),
        )
        .route(
            "/api/analytics/pain-points",
            get(routes::pain_points::get_pain_points),
        )
        .route(
            "/api/analytics/export",
            get(routes::export::export_analytics),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
