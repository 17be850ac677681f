//! Invocation instrumentation core.
//!
//! Wraps arbitrary operations, records their timing, arguments and outcome
//! in a call-scoped record, and delivers exactly one structured record per
//! invocation to an injected sink.

pub mod config;
pub mod instrument;
pub mod lifecycle;
pub mod metadata;
pub mod observability;
pub mod resilience;
pub mod sink;

pub use config::InstrumenterConfig;
pub use instrument::{CallSite, Instrumenter, LogRecord, Outcome};
pub use lifecycle::Shutdown;
pub use metadata::{MetadataResolver, OperationMetadata};
pub use sink::{LogSink, SinkError};
