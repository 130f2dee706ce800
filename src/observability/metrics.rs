//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by service, status, outcome
//! - `gateway_request_duration_seconds` (histogram): time until the response head is ready
//! - `gateway_stream_bytes_total` (counter): bytes relayed on the streaming path
//!
//! # Design Decisions
//! - `metrics` facade: recording is a no-op until an exporter is installed
//! - Prometheus exporter served on its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Service label for requests that matched no route.
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Install the Prometheus exporter. Must run inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished forward.
pub fn record_request(service: &str, status: u16, outcome: &'static str, start: Instant) {
    let service = if service.is_empty() { UNKNOWN_SERVICE } else { service }.to_string();

    metrics::counter!(
        "gateway_requests_total",
        "service" => service.clone(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    metrics::histogram!("gateway_request_duration_seconds", "service" => service)
        .record(start.elapsed().as_secs_f64());
}

/// Record bytes relayed by a finished (or abandoned) stream.
pub fn record_stream_bytes(service: &str, bytes: u64) {
    metrics::counter!("gateway_stream_bytes_total", "service" => service.to_string()).increment(bytes);
}
