//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by method, envelope code
//! - `gateway_request_duration_seconds` (histogram): inbound latency
//! - `gateway_rpc_duration_seconds` (histogram): downstream latency by service, result
//! - `gateway_schema_loads_total` (counter): schema loads by package, result
//! - `gateway_rpc_clients` (gauge): live downstream clients
//!
//! Recording is a no-op until an exporter is installed.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, code: i32, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "code" => code.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_rpc(service: &str, ok: bool, start: Instant) {
    histogram!(
        "gateway_rpc_duration_seconds",
        "service" => service.to_string(),
        "result" => if ok { "ok" } else { "error" }
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_schema_load(package: &str, ok: bool) {
    counter!(
        "gateway_schema_loads_total",
        "package" => package.to_string(),
        "result" => if ok { "ok" } else { "error" }
    )
    .increment(1);
}

pub fn record_client_count(count: usize) {
    gauge!("gateway_rpc_clients").set(count as f64);
}
