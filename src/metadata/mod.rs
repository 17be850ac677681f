//! Operation metadata resolution.
//!
//! # Data Flow
//! ```text
//! CallSite without explicit kinds
//!     → MetadataResolver::resolve(operation)
//!         - registry.rs: StaticRegistry (registered in code)
//!         - registry.rs: ReloadableRegistry (swapped on config reload)
//!     → OperationMetadata { log_kind, operate_kind }
//!     → NotFound: instrumenter logs with empty kinds and proceeds
//! ```
//!
//! # Design Decisions
//! - Resolution is a plain lookup by operation name, no reflection
//! - Missing metadata is never fatal to the wrapped call
//! - Both kinds default to the empty string

pub mod registry;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use registry::{ReloadableRegistry, StaticRegistry};

/// Descriptive tags attached to every record of an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OperationMetadata {
    /// Category of the log entry (e.g. "INSERT").
    pub log_kind: String,
    /// Kind of business operation (e.g. "CREATE").
    pub operate_kind: String,
}

impl OperationMetadata {
    pub fn new(log_kind: impl Into<String>, operate_kind: impl Into<String>) -> Self {
        Self {
            log_kind: log_kind.into(),
            operate_kind: operate_kind.into(),
        }
    }
}

/// Errors returned by a metadata lookup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    /// No metadata registered under this operation name.
    #[error("no metadata registered for operation '{0}'")]
    NotFound(String),
}

/// Looks up the metadata registered for an operation.
pub trait MetadataResolver: Send + Sync {
    fn resolve(&self, operation: &str) -> Result<OperationMetadata, MetadataError>;
}

/// Resolver with nothing registered. Every lookup reports `NotFound`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMetadata;

impl MetadataResolver for NoMetadata {
    fn resolve(&self, operation: &str) -> Result<OperationMetadata, MetadataError> {
        Err(MetadataError::NotFound(operation.to_string()))
    }
}
