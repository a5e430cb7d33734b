//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, latency, rejections)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `distriproxy_requests_total` (counter): forwarded requests by route, status
//! - `distriproxy_request_duration_seconds` (histogram): time to upstream response headers
//! - `distriproxy_rejected_requests_total` (counter): boundary responses by reason
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels for route and status code only

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::StatusCode;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus exporter on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "metrics endpoint listening");
    Ok(())
}

/// Record a forwarded request once its status is known.
pub fn record_request(route: &str, status: StatusCode, start: Instant) {
    metrics::counter!(
        "distriproxy_requests_total",
        "route" => route.to_string(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!("distriproxy_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a request answered by the proxy itself.
pub fn record_rejection(reason: &'static str) {
    metrics::counter!("distriproxy_rejected_requests_total", "reason" => reason).increment(1);
}
