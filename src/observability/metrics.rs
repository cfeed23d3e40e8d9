//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define health-check metrics
//! - Expose Prometheus-compatible metrics endpoint
//! - Track per-origin and per-group figures
//!
//! # Metrics
//! - `origin_health_probes_total` (counter): probes by group, object, outcome
//! - `origin_health_transitions_total` (counter): state changes by group, object, state
//! - `origin_health_cycle_duration_seconds` (histogram): time spent per check cycle
//! - `origin_health_routable` (gauge): 1=active, 0=otherwise
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels for group and object name only, no unbounded values

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(group: &str, object: &str, passed: bool) {
    let outcome = if passed { "pass" } else { "fail" };
    counter!(
        "origin_health_probes_total",
        "group" => group.to_string(),
        "object" => object.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_transition(group: &str, object: &str, state: &str) {
    counter!(
        "origin_health_transitions_total",
        "group" => group.to_string(),
        "object" => object.to_string(),
        "state" => state.to_string()
    )
    .increment(1);
}

pub fn record_routable(group: &str, object: &str, routable: bool) {
    gauge!(
        "origin_health_routable",
        "group" => group.to_string(),
        "object" => object.to_string()
    )
    .set(if routable { 1.0 } else { 0.0 });
}

pub fn record_cycle_duration(group: &str, elapsed: Duration) {
    histogram!(
        "origin_health_cycle_duration_seconds",
        "group" => group.to_string()
    )
    .record(elapsed.as_secs_f64());
}
