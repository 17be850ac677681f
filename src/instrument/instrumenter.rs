//! The invocation instrumenter.
//!
//! # Responsibilities
//! - Allocate a call-scoped record before the wrapped operation runs
//! - Run the operation inside its invocation context and span
//! - Emit exactly one record per invocation to the sink
//! - Return the operation's value or error to the caller unchanged
//!
//! # Design Decisions
//! - Metadata lookup and sink failures are counted, never propagated
//! - Cancellation is observed through guard drop, not polling
//! - Panics are recorded, then resumed

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::InstrumentConfig;
use crate::instrument::context::{self, InvocationContext};
use crate::instrument::guard::InvocationGuard;
use crate::instrument::record::{InvocationRecord, Outcome};
use crate::metadata::{MetadataResolver, NoMetadata, OperationMetadata};
use crate::observability::metrics;
use crate::resilience::timeouts::{with_deadline, DeadlineExceeded};
use crate::sink::LogSink;

/// Identifies a wrapped operation and optionally its metadata.
///
/// When neither kind is set, the instrumenter asks its metadata resolver.
#[derive(Debug, Clone)]
pub struct CallSite {
    operation: Arc<str>,
    log_kind: Option<String>,
    operate_kind: Option<String>,
}

impl CallSite {
    pub fn new(operation: impl Into<Arc<str>>) -> Self {
        Self {
            operation: operation.into(),
            log_kind: None,
            operate_kind: None,
        }
    }

    pub fn log_kind(mut self, log_kind: impl Into<String>) -> Self {
        self.log_kind = Some(log_kind.into());
        self
    }

    pub fn operate_kind(mut self, operate_kind: impl Into<String>) -> Self {
        self.operate_kind = Some(operate_kind.into());
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    fn explicit_metadata(&self) -> Option<OperationMetadata> {
        if self.log_kind.is_none() && self.operate_kind.is_none() {
            return None;
        }
        Some(OperationMetadata::new(
            self.log_kind.clone().unwrap_or_default(),
            self.operate_kind.clone().unwrap_or_default(),
        ))
    }
}

impl From<&'static str> for CallSite {
    fn from(operation: &'static str) -> Self {
        Self::new(operation)
    }
}

/// Internal counters.
#[derive(Debug, Default)]
struct InstrumentStats {
    started: AtomicU64,
    emitted: AtomicU64,
    sink_failures: AtomicU64,
    metadata_missing: AtomicU64,
}

/// Point-in-time copy of the instrumenter's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Invocations begun.
    pub started: u64,
    /// Records accepted by the sink.
    pub emitted: u64,
    /// Records the sink refused. They were dropped.
    pub sink_failures: u64,
    /// Lookups that found no metadata.
    pub metadata_missing: u64,
    /// Invocations begun but not yet completed.
    pub in_flight: u64,
}

/// State shared by an instrumenter and its outstanding guards.
pub(crate) struct Core {
    sink: Arc<dyn LogSink>,
    resolver: Arc<dyn MetadataResolver>,
    settings: InstrumentConfig,
    stats: InstrumentStats,
}

impl Core {
    /// Hand a completed record to the sink.
    pub(crate) fn emit(&self, record: InvocationRecord, outcome: Outcome) {
        let log = record.complete(outcome);
        metrics::record_invocation(
            &log.operation,
            log.outcome.label(),
            Duration::from_micros(log.elapsed_us),
        );

        let invocation_id = log.invocation_id;
        match self.sink.emit(log) {
            Ok(()) => {
                self.stats.emitted.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.stats.sink_failures.fetch_add(1, Ordering::Relaxed);
                metrics::record_sink_failure();
                tracing::debug!(invocation_id = %invocation_id, error = %e, "Invocation record dropped");
            }
        }
    }

    /// Apply the truncation limit to a rendered value.
    pub(crate) fn render(&self, rendered: String) -> String {
        clip(rendered, self.settings.max_argument_chars)
    }

    fn capture(&self, arguments: Vec<Value>) -> Vec<Value> {
        if !self.settings.capture_arguments {
            return Vec::new();
        }
        let max = self.settings.max_argument_chars;
        arguments.into_iter().map(|v| clip_value(v, max)).collect()
    }

    fn resolve(&self, site: &CallSite) -> OperationMetadata {
        if let Some(metadata) = site.explicit_metadata() {
            return metadata;
        }
        match self.resolver.resolve(site.operation()) {
            Ok(metadata) => metadata,
            Err(e) => {
                self.stats.metadata_missing.fetch_add(1, Ordering::Relaxed);
                metrics::record_metadata_missing();
                tracing::debug!(operation = %site.operation(), error = %e, "Logging with empty metadata");
                OperationMetadata::default()
            }
        }
    }
}

/// Wraps operations to record their timing and outcome.
///
/// Cheap to clone; clones share the sink, resolver and counters.
#[derive(Clone)]
pub struct Instrumenter {
    core: Arc<Core>,
}

impl Instrumenter {
    pub fn new(
        sink: Arc<dyn LogSink>,
        resolver: Arc<dyn MetadataResolver>,
        settings: InstrumentConfig,
    ) -> Self {
        Self {
            core: Arc::new(Core {
                sink,
                resolver,
                settings,
                stats: InstrumentStats::default(),
            }),
        }
    }

    /// Instrumenter with default settings and no registered metadata.
    pub fn with_sink(sink: Arc<dyn LogSink>) -> Self {
        Self::new(sink, Arc::new(NoMetadata), InstrumentConfig::default())
    }

    pub fn settings(&self) -> &InstrumentConfig {
        &self.core.settings
    }

    pub fn stats(&self) -> StatsSnapshot {
        let stats = &self.core.stats;
        let started = stats.started.load(Ordering::Relaxed);
        let emitted = stats.emitted.load(Ordering::Relaxed);
        let sink_failures = stats.sink_failures.load(Ordering::Relaxed);
        StatsSnapshot {
            started,
            emitted,
            sink_failures,
            metadata_missing: stats.metadata_missing.load(Ordering::Relaxed),
            in_flight: started.saturating_sub(emitted + sink_failures),
        }
    }

    /// Start an invocation by hand.
    ///
    /// For code that cannot be expressed as one closure or future. The
    /// returned guard must be completed, otherwise its drop records the
    /// invocation as cancelled.
    pub fn begin(&self, site: CallSite, arguments: Vec<Value>) -> InvocationGuard {
        let metadata = self.core.resolve(&site);
        let arguments = self.core.capture(arguments);
        let record = InvocationRecord::start(
            site.operation().to_string(),
            metadata,
            arguments,
            InvocationContext::current_id(),
        );
        self.core.stats.started.fetch_add(1, Ordering::Relaxed);

        let span = tracing::info_span!(
            "invocation",
            operation = %site.operation(),
            invocation_id = %record.invocation_id,
            parent_id = ?record.parent_id,
        );
        InvocationGuard::new(record, span, self.core.clone())
    }

    /// Run a synchronous operation and record it.
    ///
    /// Named apart from `instrument_async` so it never collides with
    /// `tracing::Instrument::instrument` when that trait is in scope.
    pub fn instrument_sync<T, E, F>(&self, site: CallSite, arguments: Vec<Value>, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        T: fmt::Debug,
        E: fmt::Display,
    {
        let guard = self.begin(site, arguments);
        let ctx = guard.context().clone();
        let span = guard.span().clone();

        match panic::catch_unwind(AssertUnwindSafe(|| {
            span.in_scope(|| context::sync_scope(ctx, op))
        })) {
            Ok(result) => {
                guard.finish_result(&result);
                result
            }
            Err(payload) => {
                guard.finish(Outcome::Panicked {
                    message: panic_message(payload.as_ref()),
                });
                panic::resume_unwind(payload)
            }
        }
    }

    /// Run an asynchronous operation and record it.
    ///
    /// Dropping the returned future before it completes records the
    /// invocation as cancelled.
    pub async fn instrument_async<T, E, Fut>(
        &self,
        site: CallSite,
        arguments: Vec<Value>,
        fut: Fut,
    ) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        T: fmt::Debug,
        E: fmt::Display,
    {
        let guard = self.begin(site, arguments);
        let ctx = guard.context().clone();
        let span = guard.span().clone();

        let run = tracing::Instrument::instrument(context::scope(ctx, fut), span);
        match AssertUnwindSafe(run).catch_unwind().await {
            Ok(result) => {
                guard.finish_result(&result);
                result
            }
            Err(payload) => {
                guard.finish(Outcome::Panicked {
                    message: panic_message(payload.as_ref()),
                });
                panic::resume_unwind(payload)
            }
        }
    }

    /// Run an asynchronous operation under a deadline.
    ///
    /// On expiry the operation is dropped, its record says `Cancelled`, and
    /// the caller gets `DeadlineExceeded` in the outer result. The inner
    /// result is the operation's own.
    pub async fn instrument_with_timeout<T, E, Fut>(
        &self,
        site: CallSite,
        arguments: Vec<Value>,
        deadline: Duration,
        fut: Fut,
    ) -> Result<Result<T, E>, DeadlineExceeded>
    where
        Fut: Future<Output = Result<T, E>>,
        T: fmt::Debug,
        E: fmt::Display,
    {
        let operation = site.operation().to_string();
        with_deadline(&operation, deadline, self.instrument_async(site, arguments, fut)).await
    }

    /// Like `instrument_with_timeout`, using `default_timeout_ms` from the
    /// settings. A zero setting runs without a deadline.
    pub async fn instrument_with_default_timeout<T, E, Fut>(
        &self,
        site: CallSite,
        arguments: Vec<Value>,
        fut: Fut,
    ) -> Result<Result<T, E>, DeadlineExceeded>
    where
        Fut: Future<Output = Result<T, E>>,
        T: fmt::Debug,
        E: fmt::Display,
    {
        match self.core.settings.default_timeout_ms {
            0 => Ok(self.instrument_async(site, arguments, fut).await),
            ms => {
                self.instrument_with_timeout(site, arguments, Duration::from_millis(ms), fut)
                    .await
            }
        }
    }
}

impl fmt::Debug for Instrumenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrumenter")
            .field("settings", &self.core.settings)
            .field("stats", &self.stats())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Truncate to `max` characters. Zero means unlimited.
fn clip(s: String, max: usize) -> String {
    if max == 0 || s.chars().count() <= max {
        return s;
    }
    let mut clipped: String = s.chars().take(max).collect();
    clipped.push_str("...");
    clipped
}

fn clip_value(value: Value, max: usize) -> Value {
    if max == 0 {
        return value;
    }
    match value {
        Value::String(s) => Value::String(clip(s, max)),
        other => {
            let rendered = other.to_string();
            if rendered.chars().count() > max {
                Value::String(clip(rendered, max))
            } else {
                other
            }
        }
    }
}
