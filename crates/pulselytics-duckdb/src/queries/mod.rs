pub mod dashboard;
pub mod export;
pub mod journey;
pub mod pain_points;

use chrono::Utc;

/// Format the "now minus N days" window cutoff the way DuckDB compares
/// TIMESTAMP columns against VARCHAR literals.
pub(crate) fn window_cutoff(window_days: u32) -> String {
    let cutoff = Utc::now() - chrono::Duration::days(i64::from(window_days));
    cutoff.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}
