//! Log sinks.
//!
//! # Data Flow
//! ```text
//! InvocationGuard completes
//!     → LogSink::emit(LogRecord)   (never blocks)
//!         - tracing_sink.rs: structured tracing event
//!         - channel.rs: bounded queue → SinkWriter task → JSON lines (stdout/file)
//!         - memory.rs: in-process buffer
//!     → Err(SinkError): record dropped and counted by the instrumenter
//! ```
//!
//! # Design Decisions
//! - Each sink owns its thread-safety; the instrumenter never locks around it
//! - Emission is best-effort: a full or closed sink drops the record
//! - A single writer task appends whole lines, so lines never interleave

pub mod channel;
pub mod memory;
pub mod tracing_sink;

use std::sync::Arc;

use thiserror::Error;

use crate::instrument::LogRecord;

pub use channel::{ChannelSink, SinkWriter};
pub use memory::MemorySink;
pub use tracing_sink::TracingSink;

/// Reasons a sink refuses a record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The sink cannot accept records right now (full, closed, disabled).
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    /// The record could not be encoded.
    #[error("record rejected: {0}")]
    Rejected(String),
}

/// Destination for completed invocation records.
pub trait LogSink: Send + Sync {
    /// Accept one record. Must not block.
    fn emit(&self, record: LogRecord) -> Result<(), SinkError>;
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn emit(&self, record: LogRecord) -> Result<(), SinkError> {
        (**self).emit(record)
    }
}
