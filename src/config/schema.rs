//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the instrumenter.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct InstrumenterConfig {
    /// How invocations are captured.
    pub instrument: InstrumentConfig,

    /// Where records are delivered.
    pub sink: SinkConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Metadata registered per operation name.
    pub operations: Vec<OperationConfig>,
}

/// Capture settings for wrapped calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Record call arguments. When false, records carry an empty list.
    pub capture_arguments: bool,

    /// Rendered arguments and results longer than this are truncated.
    /// 0 disables truncation.
    pub max_argument_chars: usize,

    /// Deadline applied by `instrument_with_default_timeout`, in milliseconds.
    /// 0 means no deadline.
    pub default_timeout_ms: u64,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            capture_arguments: true,
            max_argument_chars: 512,
            default_timeout_ms: 0,
        }
    }
}

/// Sink implementation to build.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Forward records as tracing events.
    #[default]
    Tracing,
    /// Queue records to a background JSON-lines writer.
    Channel,
}

/// Sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,

    /// Queue capacity for the channel sink. Records beyond it are dropped.
    pub capacity: usize,

    /// Output file for the channel sink. Empty writes to stdout.
    pub path: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Tracing,
            capacity: 1024,
            path: String::new(),
        }
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Subscriber output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Metadata entry for one operation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct OperationConfig {
    /// Operation name as passed to the call site.
    pub name: String,

    #[serde(default)]
    pub log_kind: String,

    #[serde(default)]
    pub operate_kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: InstrumenterConfig = toml::from_str("").unwrap();
        assert!(config.instrument.capture_arguments);
        assert_eq!(config.instrument.max_argument_chars, 512);
        assert_eq!(config.sink.kind, SinkKind::Tracing);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
        assert!(config.operations.is_empty());
    }

    #[test]
    fn test_full_config_parses() {
        let raw = r#"
            [instrument]
            capture_arguments = false
            default_timeout_ms = 250

            [sink]
            kind = "channel"
            capacity = 16
            path = "/tmp/invocations.jsonl"

            [observability]
            log_format = "json"

            [[operations]]
            name = "createUser"
            log_kind = "INSERT"
            operate_kind = "CREATE"

            [[operations]]
            name = "ping"
        "#;
        let config: InstrumenterConfig = toml::from_str(raw).unwrap();
        assert!(!config.instrument.capture_arguments);
        assert_eq!(config.instrument.default_timeout_ms, 250);
        assert_eq!(config.sink.kind, SinkKind::Channel);
        assert_eq!(config.sink.capacity, 16);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.operations.len(), 2);
        assert_eq!(config.operations[1].log_kind, "");
    }
}
