//! Metrics definitions for the mock identity provider
//!
//! All metrics follow Prometheus naming conventions:
//! - `idp_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `role`: 2 values (current, expired)
//! - `status`: 2 values (success, error) or 3 for HTTP (success, error, timeout)
//! - `endpoint`: fixed set of routes plus `/other`
//! - `error_category`: 3 values (key_unavailable, cryptographic, internal)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("idp_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // RSA signing is a few milliseconds
        .set_buckets_for_metric(
            Matcher::Prefix("idp_token_issuance".to_string()),
            &[0.001, 0.002, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))?
        // RSA key generation ranges from sub-second to tens of seconds
        .set_buckets_for_metric(
            Matcher::Prefix("idp_key_generation".to_string()),
            &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0],
        )
        .map_err(|e| format!("Failed to set key generation buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record token issuance duration and outcome
///
/// Metric: `idp_token_issuance_duration_seconds`, `idp_token_issuance_total`
/// Labels: `role`, `status`
pub fn record_token_issuance(role: &str, status: &str, duration: Duration) {
    histogram!("idp_token_issuance_duration_seconds", "role" => role.to_string(), "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("idp_token_issuance_total", "role" => role.to_string(), "status" => status.to_string())
        .increment(1);
}

// ============================================================================
// Key Management Metrics
// ============================================================================

/// Record key generation duration and outcome
///
/// Metric: `idp_key_generation_duration_seconds`, `idp_key_generation_total`
/// Labels: `role`, `status`
pub fn record_key_generation(role: &str, status: &str, duration: Duration) {
    histogram!("idp_key_generation_duration_seconds", "role" => role.to_string(), "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("idp_key_generation_total", "role" => role.to_string(), "status" => status.to_string())
        .increment(1);
}

// ============================================================================
// JWKS Metrics
// ============================================================================

/// Record JWKS request outcome
///
/// Metric: `idp_jwks_requests_total`
/// Labels: `status`
pub fn record_jwks_request(status: &str) {
    counter!("idp_jwks_requests_total", "status" => status.to_string()).increment(1);
}

// ============================================================================
// Error Metrics
// ============================================================================

/// Record error by category
///
/// Metric: `idp_errors_total`
/// Labels: `operation`, `error_category`, `status_code`
pub fn record_error(operation: &str, error_category: &str, status_code: u16) {
    counter!("idp_errors_total",
        "operation" => operation.to_string(),
        "error_category" => error_category.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `idp_http_requests_total`, `idp_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// Captures framework-level responses too, such as 405 Method Not Allowed.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("idp_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("idp_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Collapse unknown paths into `/other` to bound cardinality.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/.well-known/jwks.json" => "/.well-known/jwks.json",
        "/auth" => "/auth",
        "/health" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        _ => "/other",
    }
}
