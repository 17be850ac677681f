//! Configuration file watcher for hot reload of operation metadata.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use crate::config::loader::load_config;
use crate::config::schema::InstrumenterConfig;
use crate::metadata::ReloadableRegistry;

/// Watches the configuration file and emits every valid new version.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<InstrumenterConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<InstrumenterConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned handle must be kept alive for as long
    /// as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = ?path, "Config file change detected, reloading");
                        match load_config(&path) {
                            Ok(new_config) => {
                                let _ = tx.send(new_config);
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Apply config updates to the registry until the channel closes or
/// shutdown is signalled.
pub async fn apply_updates(
    mut updates: mpsc::UnboundedReceiver<InstrumenterConfig>,
    registry: Arc<ReloadableRegistry>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(config) => registry.reload(&config.operations),
                None => break,
            },
            _ = shutdown.recv() => {
                tracing::debug!("Config reload task received shutdown signal");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OperationConfig;
    use crate::metadata::MetadataResolver;

    #[tokio::test]
    async fn test_apply_updates_swaps_registry() {
        let registry = Arc::new(ReloadableRegistry::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(apply_updates(rx, registry.clone(), shutdown_rx));

        let mut config = InstrumenterConfig::default();
        config.operations.push(OperationConfig {
            name: "createUser".into(),
            log_kind: "INSERT".into(),
            operate_kind: "CREATE".into(),
        });
        tx.send(config).unwrap();

        for _ in 0..50 {
            if registry.resolve("createUser").is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(registry.resolve("createUser").unwrap().log_kind, "INSERT");

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();
    }
}
