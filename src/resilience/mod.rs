//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Instrumented async call:
//!     → timeouts.rs (enforce deadline, drop the operation on expiry)
//!     → guard observes the drop and records Cancelled
//! ```
//!
//! # Design Decisions
//! - Deadlines cancel by dropping the future; nothing is polled after expiry
//! - Timeout errors are distinct from the operation's own errors

pub mod timeouts;
