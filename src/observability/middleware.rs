// ============================================================================
// MIDDLEWARE PARA MÉTRICAS AUTOMÁTICAS
// ============================================================================

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::record_http_request;

/// Middleware que registra métricas de todas las requests HTTP
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let endpoint = normalize_path(req.uri().path());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    record_http_request(&method, &endpoint, response.status().as_u16(), duration);

    response
}

/// Collapse unknown paths so scanners can't blow up label cardinality.
fn normalize_path(path: &str) -> String {
    match path {
        "/health" | "/metrics" | "/transcript" | "/available" | "/admin/purge" => path.to_string(),
        _ => "other".to_string(),
    }
}
