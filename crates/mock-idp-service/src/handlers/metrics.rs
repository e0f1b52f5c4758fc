//! Prometheus metrics endpoint handler.
//!
//! Unauthenticated so Prometheus can scrape it. Labels carry only bounded
//! operational values; no keys or tokens are exposed.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns Prometheus text format:
/// ```text
/// # TYPE idp_token_issuance_total counter
/// idp_token_issuance_total{role="current",status="success"} 42
/// ```
#[tracing::instrument(skip_all, name = "idp.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
