//! RAII guard owning one invocation record.

use std::fmt;
use std::sync::Arc;

use crate::instrument::context::InvocationContext;
use crate::instrument::instrumenter::Core;
use crate::instrument::record::{InvocationRecord, Outcome};

/// Owns the record of one in-flight invocation and guarantees it is
/// emitted exactly once.
///
/// Completing the guard (`succeed`, `fail`, `finish`) emits the record with
/// that outcome. Dropping it first emits `Cancelled`, or `Panicked` when the
/// drop happens during unwinding.
pub struct InvocationGuard {
    record: Option<InvocationRecord>,
    context: InvocationContext,
    span: tracing::Span,
    core: Arc<Core>,
}

impl InvocationGuard {
    pub(crate) fn new(record: InvocationRecord, span: tracing::Span, core: Arc<Core>) -> Self {
        let context = InvocationContext::new(
            record.invocation_id,
            record.parent_id,
            Arc::from(record.operation.as_str()),
            record.start_instant(),
        );
        Self {
            record: Some(record),
            context,
            span,
            core,
        }
    }

    pub fn context(&self) -> &InvocationContext {
        &self.context
    }

    /// Span covering the invocation.
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Complete with a successful result.
    pub fn succeed<T: fmt::Debug + ?Sized>(self, result: &T) {
        let result = self.core.render(format!("{:?}", result));
        self.finish(Outcome::Success { result });
    }

    /// Complete with the operation's error.
    pub fn fail<E: fmt::Display + ?Sized>(self, error: &E) {
        let error = self.core.render(error.to_string());
        self.finish(Outcome::Failure { error });
    }

    /// Complete from the operation's return value.
    pub fn finish_result<T: fmt::Debug, E: fmt::Display>(self, result: &Result<T, E>) {
        match result {
            Ok(value) => self.succeed(value),
            Err(error) => self.fail(error),
        }
    }

    /// Complete with an explicit outcome.
    pub fn finish(mut self, outcome: Outcome) {
        self.emit(outcome);
    }

    fn emit(&mut self, outcome: Outcome) {
        if let Some(record) = self.record.take() {
            self.core.emit(record, outcome);
        }
    }
}

impl Drop for InvocationGuard {
    fn drop(&mut self) {
        if self.record.is_none() {
            return;
        }
        let outcome = if std::thread::panicking() {
            Outcome::Panicked {
                message: "panicked while in flight".to_string(),
            }
        } else {
            Outcome::Cancelled
        };
        self.emit(outcome);
    }
}

impl fmt::Debug for InvocationGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationGuard")
            .field("invocation_id", &self.context.invocation_id)
            .field("operation", &self.context.operation)
            .field("finished", &self.record.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::instrument::{CallSite, Instrumenter, Outcome};
    use crate::sink::MemorySink;

    fn setup() -> (Instrumenter, MemorySink) {
        let sink = MemorySink::new();
        (Instrumenter::with_sink(Arc::new(sink.clone())), sink)
    }

    #[test]
    fn test_drop_emits_cancelled() {
        let (instrumenter, sink) = setup();
        let guard = instrumenter.begin(CallSite::new("upload"), vec![]);
        drop(guard);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, Outcome::Cancelled);
    }

    #[test]
    fn test_finish_emits_once() {
        let (instrumenter, sink) = setup();
        let guard = instrumenter.begin(CallSite::new("upload"), vec![]);
        guard.succeed(&7u32);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, Outcome::Success { result: "7".into() });
        assert_eq!(instrumenter.stats().in_flight, 0);
    }

    #[test]
    fn test_fail_renders_display() {
        let (instrumenter, sink) = setup();
        let guard = instrumenter.begin(CallSite::new("upload"), vec![]);
        guard.fail("disk full");

        assert_eq!(
            sink.records()[0].outcome,
            Outcome::Failure { error: "disk full".into() }
        );
    }
}
