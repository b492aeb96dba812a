//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define server metrics (lookups, builds, evictions, requests)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `cache_lookups_total` (counter): by result (hit, miss, stale)
//! - `cache_builds_total` (counter): by outcome (ok, error)
//! - `cache_build_duration_seconds` (histogram): renderer latency
//! - `cache_evictions_total` (counter): by reason (expired, invalidated)
//! - `cache_entries` (gauge): live entries
//! - `http_requests_total` (counter): by status code
//! - `http_request_duration_seconds` (histogram): end-to-end latency
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Low-cardinality labels only; resource paths never become labels

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_cache_lookup(result: &'static str) {
    counter!("cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_build(outcome: &'static str) {
    counter!("cache_builds_total", "outcome" => outcome).increment(1);
}

pub fn record_build_duration(elapsed: Duration) {
    histogram!("cache_build_duration_seconds").record(elapsed);
}

pub fn record_cache_eviction(reason: &'static str) {
    counter!("cache_evictions_total", "reason" => reason).increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("cache_entries").set(entries as f64);
}

/// Record a completed HTTP request.
pub fn record_request(status: u16, start_time: Instant) {
    counter!("http_requests_total", "status" => status.to_string()).increment(1);
    histogram!("http_request_duration_seconds").record(start_time.elapsed());
}
