pub mod actions;
pub mod dashboard;
pub mod export;
pub mod features;
pub mod health;
pub mod journey;
pub mod pain_points;
pub mod performance;
pub mod realtime;
pub mod sessions;

use axum::http::HeaderMap;

/// Substituted when a payload omits `user_id`.
pub(crate) const DEFAULT_USER_ID: &str = "anonymous";

/// Substituted when a payload omits `platform`.
pub(crate) const DEFAULT_PLATFORM: &str = "unknown";

/// Extract the client IP from `X-Forwarded-For` (first entry) for the ingest
/// rate limiter. Falls back to `"unknown"` when the header is absent.
pub(crate) fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
