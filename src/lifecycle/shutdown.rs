//! Shutdown coordination for background tasks.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Coordinator for graceful shutdown.
///
/// Tasks spawned through it receive a shutdown receiver; `complete`
/// signals them and waits for each to finish.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            tasks: Vec::new(),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Spawn a named background task that is handed a shutdown receiver.
    pub fn spawn<F, Fut>(&mut self, name: &'static str, task: F)
    where
        F: FnOnce(broadcast::Receiver<()>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task(self.subscribe()));
        self.tasks.push((name, handle));
    }

    /// Number of registered tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Signal every task and wait until `deadline` has passed in total.
    /// Returns how many tasks had to be aborted.
    pub async fn complete(self, deadline: Duration) -> usize {
        let _ = self.tx.send(());
        let cutoff = Instant::now() + deadline;
        let mut aborted = 0;

        for (name, mut handle) in self.tasks {
            match tokio::time::timeout_at(cutoff, &mut handle).await {
                Ok(Ok(())) => tracing::debug!(task = name, "Task stopped"),
                Ok(Err(e)) => tracing::error!(task = name, error = %e, "Task failed"),
                Err(_) => {
                    tracing::warn!(task = name, "Task did not stop in time, aborting");
                    handle.abort();
                    aborted += 1;
                }
            }
        }
        aborted
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tasks_stop_on_signal() {
        let mut shutdown = Shutdown::new();
        shutdown.spawn("waiter", |mut rx| async move {
            let _ = rx.recv().await;
        });
        assert_eq!(shutdown.task_count(), 1);

        assert_eq!(shutdown.complete(Duration::from_secs(1)).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_task_is_aborted() {
        let mut shutdown = Shutdown::new();
        shutdown.spawn("stuck", |_rx| async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        assert_eq!(shutdown.complete(Duration::from_millis(100)).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_covers_all_tasks() {
        let mut shutdown = Shutdown::new();
        for name in ["stuck-a", "stuck-b", "stuck-c"] {
            shutdown.spawn(name, |_rx| async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            });
        }

        let started = Instant::now();
        assert_eq!(shutdown.complete(Duration::from_millis(100)).await, 3);
        assert!(started.elapsed() < Duration::from_millis(200));
    }
}
