//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dynconf_cache_lookups_total` (counter): store cache hits/misses
//! - `dynconf_document_writes_total` (counter): document writes by domain, outcome
//! - `dynconf_registrations_total` (counter): default keys added to documents
//! - `dynconf_client_fallbacks_total` (counter): client calls answered with defaults
//! - `dynconf_http_requests_total` (counter): API requests by method, status
//! - `dynconf_http_request_duration_seconds` (histogram): API latency
//!
//! Recording is a no-op until a recorder is installed by `init_metrics`.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::store::Domain;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!("dynconf_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_document_write(domain: Domain, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!(
        "dynconf_document_writes_total",
        "domain" => domain.wire_name(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_registrations(domain: Domain, count: usize) {
    metrics::counter!("dynconf_registrations_total", "domain" => domain.wire_name())
        .increment(count as u64);
}

pub fn record_client_fallback(reason: &'static str) {
    metrics::counter!("dynconf_client_fallbacks_total", "reason" => reason).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "dynconf_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("dynconf_http_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}
