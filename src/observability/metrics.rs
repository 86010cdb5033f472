//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_chain_operations_total` (counter): chain operations by op, outcome
//! - `bridge_chain_operation_duration_seconds` (histogram): latency by op
//! - `bridge_http_requests_total` (counter): requests by route, status
//! - `bridge_rpc_healthy` (gauge): 1=reachable, 0=unreachable
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

/// Record one chain operation and its latency.
pub fn record_chain_operation(op: &'static str, outcome: &'static str, start: Instant) {
    metrics::counter!("bridge_chain_operations_total", "op" => op, "outcome" => outcome)
        .increment(1);
    metrics::histogram!("bridge_chain_operation_duration_seconds", "op" => op)
        .record(start.elapsed().as_secs_f64());
}

/// Record one HTTP response.
pub fn record_request(route: String, status: u16) {
    metrics::counter!(
        "bridge_http_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record the latest RPC health probe.
pub fn record_rpc_health(healthy: bool) {
    metrics::gauge!("bridge_rpc_healthy").set(if healthy { 1.0 } else { 0.0 });
}
