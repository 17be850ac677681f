//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Instrumenter and its collaborators produce:
//!     → logging.rs (structured log events, invocation spans)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, file, remote)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Invocation ID flows through every span and record
//! - Metrics are cheap (atomic increments), recorded even without an exporter

pub mod logging;
pub mod metrics;
