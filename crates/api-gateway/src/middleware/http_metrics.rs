//! HTTP metrics middleware.
//!
//! Applied as the outermost layer so 401/403 from the policy layer and
//! framework responses (404, 405) are counted with everything else.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Record method, endpoint, status code and duration for every response.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status_code = response.status().as_u16();
    record_http_request(&method, &path, status_code, start.elapsed());

    response
}
