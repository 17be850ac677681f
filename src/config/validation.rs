//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject empty or duplicate operation names
//! - Validate value ranges (sink capacity > 0) and addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: InstrumenterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{InstrumenterConfig, SinkKind};

/// A single semantic problem in a config.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("operation at index {0} has an empty name")]
    EmptyOperationName(usize),

    #[error("operation '{0}' is declared more than once")]
    DuplicateOperation(String),

    #[error("sink capacity must be greater than zero")]
    ZeroSinkCapacity,

    #[error("sink path is only used by the channel sink")]
    PathWithoutChannel,

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

pub fn validate_config(config: &InstrumenterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for (i, op) in config.operations.iter().enumerate() {
        if op.name.trim().is_empty() {
            errors.push(ValidationError::EmptyOperationName(i));
        } else if !seen.insert(op.name.as_str()) {
            errors.push(ValidationError::DuplicateOperation(op.name.clone()));
        }
    }

    if config.sink.capacity == 0 {
        errors.push(ValidationError::ZeroSinkCapacity);
    }
    if config.sink.kind != SinkKind::Channel && !config.sink.path.is_empty() {
        errors.push(ValidationError::PathWithoutChannel);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
