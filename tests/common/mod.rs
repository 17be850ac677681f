//! Shared fixtures for integration tests.

use std::sync::Arc;
use std::time::Duration;

use invocation_instrumenter::config::InstrumentConfig;
use invocation_instrumenter::metadata::StaticRegistry;
use invocation_instrumenter::sink::MemorySink;
use invocation_instrumenter::Instrumenter;

/// Error type standing in for a business failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFoundError {
    pub id: u64,
}

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user {} not found", self.id)
    }
}

impl std::error::Error for NotFoundError {}

/// Instrumenter backed by a memory sink, with `deleteUser` registered.
pub fn memory_instrumenter() -> (Instrumenter, MemorySink) {
    memory_instrumenter_with(InstrumentConfig::default())
}

pub fn memory_instrumenter_with(settings: InstrumentConfig) -> (Instrumenter, MemorySink) {
    let sink = MemorySink::new();
    let registry = StaticRegistry::new().with("deleteUser", "DELETE", "REMOVE");
    let instrumenter = Instrumenter::new(Arc::new(sink.clone()), Arc::new(registry), settings);
    (instrumenter, sink)
}

/// Poll until the sink holds `expected` records or a second passes.
#[allow(dead_code)]
pub async fn wait_for_records(sink: &MemorySink, expected: usize) {
    for _ in 0..100 {
        if sink.len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
