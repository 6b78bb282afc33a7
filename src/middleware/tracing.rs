use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, info_span, Instrument};

/// Wrap every request in a span carrying a fresh request id, and log the
/// outcome with latency once the handler returns.
pub async fn request_tracing_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str())
        .unwrap_or("unknown")
        .to_string();

    let span = info_span!(
        "http_request",
        method = %method,
        uri = %uri,
        route = %route,
        request_id = %uuid::Uuid::now_v7(),
    );

    let start_time = Instant::now();
    let response = next.run(request).instrument(span).await;
    let latency_ms = start_time.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    info!(%method, route, status, latency_ms, "request completed");

    response
}
