//! `/metrics` endpoint for Prometheus scraping.
//!
//! Unauthenticated. Labels carry only bounded operational values; usernames,
//! tokens and user ids never appear.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// GET /metrics
#[tracing::instrument(skip_all, name = "auth.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
