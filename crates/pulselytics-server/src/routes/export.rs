use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use pulselytics_core::analytics::ExportResult;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
    pub days: Option<u32>,
}

/// `GET /api/analytics/export?format=json|csv&days=` — aggregated summary of
/// the trailing window for reporting.
///
/// `json` (the default) returns the full payload: summary, per-platform
/// performance, and the daily engagement series. `csv` renders the summary
/// and per-platform sections as a three-column table with
/// `Content-Disposition: attachment`.
#[tracing::instrument(skip(state))]
pub async fn export_analytics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let days = query.days.unwrap_or(30);
    if days == 0 || days > state.config.export_max_days {
        return Err(AppError::BadRequest(format!(
            "days must be between 1 and {}",
            state.config.export_max_days
        )));
    }

    let format = query.format.as_deref().unwrap_or("json");
    if format != "json" && format != "csv" {
        return Err(AppError::BadRequest(format!(
            "unsupported format: {format}; expected 'json' or 'csv'"
        )));
    }

    let result = state
        .analytics
        .get_export_summary(days)
        .await
        .map_err(AppError::Internal)?;

    if format == "csv" {
        let csv_bytes = build_csv(&result).map_err(AppError::Internal)?;
        let filename = format!("analytics-export-{days}d.csv");
        return build_csv_response(&filename, csv_bytes);
    }

    Ok(Json(result).into_response())
}

/// Sanitize a CSV field value against formula injection.
///
/// Spreadsheet apps (Excel, Google Sheets, LibreOffice) interpret values that
/// begin with `=`, `+`, `-`, `@`, TAB, or CR as formula expressions.
/// Prepending a single quote (`'`) causes them to treat the value as a
/// literal string. Platform names are client-supplied and untrusted.
fn sanitize_csv_field(val: &str) -> std::borrow::Cow<'_, str> {
    if val.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        std::borrow::Cow::Owned(format!("'{val}"))
    } else {
        std::borrow::Cow::Borrowed(val)
    }
}

fn build_csv(result: &ExportResult) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    wtr.write_record(["scope", "metric", "value"])
        .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;

    let s = &result.summary;
    let summary_rows: [(&str, String); 5] = [
        ("total_sessions", s.total_sessions.to_string()),
        ("unique_users", s.unique_users.to_string()),
        ("avg_session_duration", format!("{:.2}", s.avg_session_duration)),
        ("total_actions", s.total_actions.to_string()),
        (
            "avg_actions_per_session",
            format!("{:.2}", s.avg_actions_per_session),
        ),
    ];
    for (metric, value) in &summary_rows {
        wtr.write_record(["summary", metric, value])
            .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;
    }

    for p in &result.platform_performance {
        let scope = format!("platform:{}", sanitize_csv_field(&p.platform));
        let platform_rows: [(&str, String); 4] = [
            ("sessions", p.sessions.to_string()),
            ("avg_duration_seconds", format!("{:.2}", p.avg_duration)),
            ("avg_actions", format!("{:.2}", p.avg_actions)),
            ("unique_users", p.unique_users.to_string()),
        ];
        for (metric, value) in &platform_rows {
            wtr.write_record([scope.as_str(), metric, value])
                .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;
        }
    }

    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("csv finalize failed: {e}"))
}

fn build_csv_response(filename: &str, csv_bytes: Vec<u8>) -> Result<Response, AppError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid disposition header: {e}")))?;

    let mut response = (StatusCode::OK, csv_bytes).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}
