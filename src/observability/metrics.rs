//! Metrics collection and exposition.
//!
//! # Metrics
//! - `instrument_invocations_total` (counter): completed invocations by operation, outcome
//! - `instrument_invocation_duration_seconds` (histogram): latency by operation
//! - `instrument_sink_failures_total` (counter): records dropped by the sink
//! - `instrument_metadata_missing_total` (counter): lookups without metadata
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exporter is opt-in via config

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_invocation(operation: &str, outcome: &'static str, elapsed: Duration) {
    counter!(
        "instrument_invocations_total",
        "operation" => operation.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "instrument_invocation_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_sink_failure() {
    counter!("instrument_sink_failures_total").increment(1);
}

pub fn record_metadata_missing() {
    counter!("instrument_metadata_missing_total").increment(1);
}
