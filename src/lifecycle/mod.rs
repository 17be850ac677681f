//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Build sink → Start background tasks
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C or workload done → Trigger → Writer drains queue → Tasks joined
//! ```
//!
//! # Design Decisions
//! - Background tasks are registered with the coordinator when spawned
//! - Shutdown has timeout: tasks still running after the deadline are aborted

pub mod shutdown;

pub use shutdown::Shutdown;
