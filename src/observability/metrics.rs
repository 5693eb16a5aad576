//! Metrics collection and exposition.
//!
//! # Metrics
//! - `db_connect_attempts_total` (counter): every database connect attempt
//! - `db_connect_failures_total` (counter): exhausted connect sequences
//! - `startup_duration_seconds` (gauge): time from config load to ready
//! - `rpc_calls_total` (counter): RPC calls by method and outcome
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_connect_attempt() {
    metrics::counter!("db_connect_attempts_total").increment(1);
}

pub fn record_connect_failure() {
    metrics::counter!("db_connect_failures_total").increment(1);
}

pub fn record_startup(elapsed: Duration) {
    metrics::gauge!("startup_duration_seconds").set(elapsed.as_secs_f64());
}

pub fn record_rpc_call(method: &'static str, outcome: &'static str) {
    metrics::counter!("rpc_calls_total", "method" => method, "outcome" => outcome).increment(1);
}
