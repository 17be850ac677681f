//! Sink forwarding records to the tracing subscriber.

use crate::instrument::{LogRecord, Outcome};
use crate::sink::{LogSink, SinkError};

/// Emits each record as a tracing event with target `invocation`.
///
/// Successes log at INFO, everything else at WARN. The full record is
/// attached as JSON in the message so a JSON subscriber can ship it as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, record: LogRecord) -> Result<(), SinkError> {
        let payload =
            serde_json::to_string(&record).map_err(|e| SinkError::Rejected(e.to_string()))?;

        match &record.outcome {
            Outcome::Success { .. } => tracing::info!(
                target: "invocation",
                invocation_id = %record.invocation_id,
                operation = %record.operation,
                log_kind = %record.log_kind,
                operate_kind = %record.operate_kind,
                elapsed_ms = record.elapsed_ms,
                outcome = record.outcome.label(),
                "{}",
                payload
            ),
            Outcome::Failure { error } => tracing::warn!(
                target: "invocation",
                invocation_id = %record.invocation_id,
                operation = %record.operation,
                log_kind = %record.log_kind,
                operate_kind = %record.operate_kind,
                elapsed_ms = record.elapsed_ms,
                outcome = record.outcome.label(),
                error = %error,
                "{}",
                payload
            ),
            Outcome::Cancelled | Outcome::Panicked { .. } => tracing::warn!(
                target: "invocation",
                invocation_id = %record.invocation_id,
                operation = %record.operation,
                log_kind = %record.log_kind,
                operate_kind = %record.operate_kind,
                elapsed_ms = record.elapsed_ms,
                outcome = record.outcome.label(),
                "{}",
                payload
            ),
        }
        Ok(())
    }
}
