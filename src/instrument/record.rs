//! Invocation records and their serialized form.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::metadata::OperationMetadata;

/// How a wrapped call ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The operation returned normally.
    Success { result: String },
    /// The operation returned an error. The caller received it unchanged.
    Failure { error: String },
    /// The operation was dropped before it completed (caller cancellation
    /// or deadline).
    Cancelled,
    /// The operation panicked. The panic kept unwinding after the record
    /// was emitted.
    Panicked { message: String },
}

impl Outcome {
    /// Short label used for metrics and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success { .. } => "success",
            Outcome::Failure { .. } => "failure",
            Outcome::Cancelled => "cancelled",
            Outcome::Panicked { .. } => "panicked",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// State of one in-flight invocation.
///
/// Owned by exactly one [`InvocationGuard`](super::InvocationGuard) and never
/// shared, so it carries no synchronization.
#[derive(Debug)]
pub struct InvocationRecord {
    pub invocation_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub operation: String,
    pub metadata: OperationMetadata,
    pub arguments: Vec<Value>,
    pub started_at: SystemTime,
    start: Instant,
}

impl InvocationRecord {
    pub(crate) fn start(
        operation: String,
        metadata: OperationMetadata,
        arguments: Vec<Value>,
        parent_id: Option<Uuid>,
    ) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            parent_id,
            operation,
            metadata,
            arguments,
            started_at: SystemTime::now(),
            start: Instant::now(),
        }
    }

    /// Monotonic start instant.
    pub fn start_instant(&self) -> Instant {
        self.start
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Seal the record with its outcome. Consumes the record so the outcome
    /// can only be set once.
    pub(crate) fn complete(self, outcome: Outcome) -> LogRecord {
        let elapsed = self.elapsed();
        LogRecord {
            invocation_id: self.invocation_id,
            parent_id: self.parent_id,
            operation: self.operation,
            log_kind: self.metadata.log_kind,
            operate_kind: self.metadata.operate_kind,
            arguments: self.arguments,
            started_at_ms: self
                .started_at
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            elapsed_ms: elapsed.as_millis() as u64,
            elapsed_us: elapsed.as_micros() as u64,
            outcome,
        }
    }
}

/// Structured entry delivered to a [`LogSink`](crate::sink::LogSink).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub invocation_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    pub operation: String,
    pub log_kind: String,
    pub operate_kind: String,
    pub arguments: Vec<Value>,
    /// Wall-clock start, milliseconds since the Unix epoch.
    pub started_at_ms: u64,
    pub elapsed_ms: u64,
    pub elapsed_us: u64,
    pub outcome: Outcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complete_copies_fields() {
        let record = InvocationRecord::start(
            "createUser".into(),
            OperationMetadata::new("INSERT", "CREATE"),
            vec![json!({"user_name": "alice"})],
            None,
        );
        let id = record.invocation_id;

        let log = record.complete(Outcome::Success { result: "42".into() });
        assert_eq!(log.invocation_id, id);
        assert_eq!(log.operation, "createUser");
        assert_eq!(log.log_kind, "INSERT");
        assert_eq!(log.operate_kind, "CREATE");
        assert_eq!(log.arguments, vec![json!({"user_name": "alice"})]);
        assert!(log.started_at_ms > 0);
        assert!(log.outcome.is_success());
    }

    #[test]
    fn test_outcome_serialization() {
        let failure = serde_json::to_value(Outcome::Failure { error: "not found".into() }).unwrap();
        assert_eq!(failure, json!({"status": "failure", "error": "not found"}));

        let cancelled = serde_json::to_value(Outcome::Cancelled).unwrap();
        assert_eq!(cancelled, json!({"status": "cancelled"}));
    }

    #[test]
    fn test_parent_id_omitted_when_absent() {
        let log = InvocationRecord::start("ping".into(), OperationMetadata::default(), vec![], None)
            .complete(Outcome::Cancelled);
        let value = serde_json::to_value(&log).unwrap();
        assert!(value.get("parent_id").is_none());
        assert_eq!(value["log_kind"], json!(""));
    }
}
