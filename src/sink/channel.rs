//! Queue-backed sink with a single append-only writer task.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};

use crate::instrument::LogRecord;
use crate::sink::{LogSink, SinkError};

/// Enqueues records for a [`SinkWriter`]. Never waits for queue space.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<LogRecord>,
}

impl ChannelSink {
    /// Create a sink with a queue of `capacity` records and the receiver
    /// to hand to a [`SinkWriter`].
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<LogRecord>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl LogSink for ChannelSink {
    fn emit(&self, record: LogRecord) -> Result<(), SinkError> {
        self.tx.try_send(record).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Unavailable("queue full".into()),
            TrySendError::Closed(_) => SinkError::Unavailable("writer stopped".into()),
        })
    }
}

/// Drains the queue and appends one JSON line per record.
pub struct SinkWriter<W> {
    rx: mpsc::Receiver<LogRecord>,
    out: W,
    written: u64,
}

impl<W: AsyncWrite + Unpin> SinkWriter<W> {
    pub fn new(rx: mpsc::Receiver<LogRecord>, out: W) -> Self {
        Self { rx, out, written: 0 }
    }

    /// Write records until every sender is gone or shutdown is signalled.
    /// On shutdown the queue is closed and what is already queued is
    /// still written. Returns the number of lines written.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> std::io::Result<u64> {
        loop {
            tokio::select! {
                record = self.rx.recv() => match record {
                    Some(record) => self.write(&record).await?,
                    None => break,
                },
                _ = shutdown.recv() => {
                    tracing::debug!("Sink writer received shutdown signal, draining queue");
                    self.rx.close();
                    while let Some(record) = self.rx.recv().await {
                        self.write(&record).await?;
                    }
                    break;
                }
            }
        }

        self.out.flush().await?;
        tracing::info!(records = self.written, "Sink writer stopped");
        Ok(self.written)
    }

    async fn write(&mut self, record: &LogRecord) -> std::io::Result<()> {
        let mut line = match serde_json::to_vec(record) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(invocation_id = %record.invocation_id, error = %e, "Skipping unencodable record");
                return Ok(());
            }
        };
        line.push(b'\n');
        self.out.write_all(&line).await?;
        self.written += 1;
        Ok(())
    }
}
