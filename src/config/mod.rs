//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → InstrumenterConfig (validated, immutable)
//!     → instrument settings, sink, observability, operation metadata
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new config sent to the owner, which swaps the metadata registry
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::InstrumenterConfig;
pub use schema::InstrumentConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::OperationConfig;
pub use schema::SinkConfig;
pub use schema::SinkKind;
