//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dashboard_requests_total` (counter): requests by route, status
//! - `dashboard_request_duration_seconds` (histogram): latency by route
//! - `dashboard_cache_lookups_total` (counter): table cache hits/misses by hash
//! - `dashboard_upstream_fetch_seconds` (histogram): upstream latency by source, outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a served API request.
pub fn record_request(route: &str, status: u16, start: Instant) {
    counter!(
        "dashboard_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("dashboard_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a table cache lookup.
pub fn record_cache_lookup(hash: &str, hit: bool) {
    counter!(
        "dashboard_cache_lookups_total",
        "hash" => hash.to_string(),
        "result" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}

/// Record an upstream fetch.
pub fn record_fetch(source: &str, ok: bool, start: Instant) {
    histogram!(
        "dashboard_upstream_fetch_seconds",
        "source" => source.to_string(),
        "outcome" => if ok { "ok" } else { "error" }
    )
    .record(start.elapsed().as_secs_f64());
}
