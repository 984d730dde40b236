//! Metrics definitions for the auth service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `auth_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `kind`: 2 values (access, refresh)
//! - `status`: 2 values (success, error)
//! - `error_category`: bounded by `VerificationFailure::category` and `ErrorCategory`
//! - `path`: known routes plus `/other`

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return the handle served on `/metrics`.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("auth_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Signing is sub-millisecond; bcrypt dominates login/register.
        .set_buckets_for_metric(
            Matcher::Prefix("auth_token_issuance".to_string()),
            &[
                0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.250, 0.500,
            ],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record token issuance duration and outcome
///
/// Metric: `auth_token_issuance_duration_seconds`, `auth_token_issuance_total`
/// Labels: `kind`, `status`
pub fn record_token_issuance(kind: &str, status: &str, duration: Duration) {
    histogram!("auth_token_issuance_duration_seconds", "kind" => kind.to_string(), "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("auth_token_issuance_total", "kind" => kind.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record token validation result
///
/// Metric: `auth_token_validations_total`
/// Labels: `status`, `error_category`
pub fn record_token_validation(status: &str, error_category: Option<&str>) {
    let category = error_category.unwrap_or("none");
    counter!("auth_token_validations_total", "status" => status.to_string(), "error_category" => category.to_string())
        .increment(1);
}

/// Record a refresh attempt
///
/// Metric: `auth_refresh_total`
/// Labels: `status`, `error_category`
pub fn record_refresh(status: &str, error_category: Option<&str>) {
    let category = error_category.unwrap_or("none");
    counter!("auth_refresh_total", "status" => status.to_string(), "error_category" => category.to_string())
        .increment(1);
}

/// Record a login attempt
///
/// Metric: `auth_login_total`
/// Labels: `status`, `error_category`
pub fn record_login(status: &str, error_category: Option<&str>) {
    let category = error_category.unwrap_or("none");
    counter!("auth_login_total", "status" => status.to_string(), "error_category" => category.to_string())
        .increment(1);
}

/// Record a registration attempt
///
/// Metric: `auth_registration_total`
/// Labels: `status`, `error_category`
pub fn record_registration(status: &str, error_category: Option<&str>) {
    let category = error_category.unwrap_or("none");
    counter!("auth_registration_total", "status" => status.to_string(), "error_category" => category.to_string())
        .increment(1);
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `auth_http_requests_total`, `auth_http_request_duration_seconds`
/// Labels: `method`, `path`, `status_code`
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let normalized_path = normalize_path(path);

    histogram!("auth_http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => normalized_path.to_string(),
        "status_code" => status_code.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("auth_http_requests_total",
        "method" => method.to_string(),
        "path" => normalized_path.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Collapse unknown paths to `/other` so the label stays bounded.
fn normalize_path(path: &str) -> &'static str {
    match path {
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/api/auth/login" => "/api/auth/login",
        "/api/auth/register" => "/api/auth/register",
        "/api/auth/refresh" => "/api/auth/refresh",
        "/api/auth/logout" => "/api/auth/logout",
        "/api/auth/validate" => "/api/auth/validate",
        "/api/auth/profile" => "/api/auth/profile",
        "/api/auth/health" => "/api/auth/health",
        _ => "/other",
    }
}
