//! In-process metadata registries.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::config::OperationConfig;
use crate::metadata::{MetadataError, MetadataResolver, OperationMetadata};

/// Registry populated in code, safe to extend while in use.
#[derive(Debug, Default, Clone)]
pub struct StaticRegistry {
    entries: Arc<DashMap<String, OperationMetadata>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) metadata for an operation.
    pub fn register(&self, operation: impl Into<String>, metadata: OperationMetadata) {
        self.entries.insert(operation.into(), metadata);
    }

    /// Builder-style registration.
    pub fn with(self, operation: impl Into<String>, log_kind: &str, operate_kind: &str) -> Self {
        self.register(operation, OperationMetadata::new(log_kind, operate_kind));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetadataResolver for StaticRegistry {
    fn resolve(&self, operation: &str) -> Result<OperationMetadata, MetadataError> {
        self.entries
            .get(operation)
            .map(|r| r.value().clone())
            .ok_or_else(|| MetadataError::NotFound(operation.to_string()))
    }
}

/// Registry whose whole table is swapped atomically on reload.
///
/// Readers never block; a lookup sees either the old or the new table,
/// never a mix.
#[derive(Debug, Default)]
pub struct ReloadableRegistry {
    table: ArcSwap<HashMap<String, OperationMetadata>>,
}

impl ReloadableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the `[[operations]]` config entries.
    pub fn from_config(operations: &[OperationConfig]) -> Self {
        let registry = Self::new();
        registry.reload(operations);
        registry
    }

    /// Replace the table with the given entries.
    pub fn reload(&self, operations: &[OperationConfig]) {
        let table: HashMap<String, OperationMetadata> = operations
            .iter()
            .map(|op| {
                (
                    op.name.clone(),
                    OperationMetadata::new(op.log_kind.clone(), op.operate_kind.clone()),
                )
            })
            .collect();
        let count = table.len();
        self.table.store(Arc::new(table));
        tracing::info!(operations = count, "Operation metadata loaded");
    }

    pub fn len(&self) -> usize {
        self.table.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.load().is_empty()
    }
}

impl MetadataResolver for ReloadableRegistry {
    fn resolve(&self, operation: &str) -> Result<OperationMetadata, MetadataError> {
        self.table
            .load()
            .get(operation)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(operation.to_string()))
    }
}
