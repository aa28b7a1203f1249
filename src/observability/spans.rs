//! Span helpers for the query and request paths.

use tracing::{span, Level, Span};

/// Create a span for resolving one metric query
#[inline]
pub fn query_span(metric: &str) -> Span {
    span!(Level::INFO, "metrics.query", metric.name = %metric)
}

/// Create a span for one inbound HTTP request
#[inline]
pub fn http_request_span(method: &str, path: &str, client_addr: &str) -> Span {
    span!(
        Level::INFO,
        "metrics.http_request",
        http.method = %method,
        http.target = %path,
        client.address = %client_addr
    )
}

/// Create a span for a full snapshot
#[inline]
pub fn snapshot_span() -> Span {
    span!(Level::DEBUG, "metrics.snapshot")
}
