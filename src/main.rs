//! Invocation instrumenter demo binary.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller ──▶ Instrumenter ──▶ wrapped operation
//!                 │   ▲
//!                 │   └── MetadataResolver (ReloadableRegistry ◀── config watcher)
//!                 ▼
//!           InvocationGuard (one record per call)
//!                 │
//!                 ▼
//!              LogSink ──▶ tracing subscriber | JSON-lines writer task
//!                 │
//!                 └── metrics (Prometheus, optional)
//! ```
//!
//! Loads the config, builds the sink and registry, then drives a simulated
//! user-service workload through the instrumenter and prints its counters.

mod demo;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use invocation_instrumenter::config::loader::load_config;
use invocation_instrumenter::config::watcher::{apply_updates, ConfigWatcher};
use invocation_instrumenter::config::{InstrumenterConfig, SinkKind};
use invocation_instrumenter::instrument::LogRecord;
use invocation_instrumenter::metadata::ReloadableRegistry;
use invocation_instrumenter::observability::{logging, metrics};
use invocation_instrumenter::sink::{ChannelSink, SinkWriter, TracingSink};
use invocation_instrumenter::{Instrumenter, LogSink, Shutdown};

#[derive(Parser)]
#[command(name = "instrumenter")]
#[command(about = "Run a simulated workload through the invocation instrumenter", long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Total number of invocations.
    #[arg(short = 'n', long, default_value_t = 100)]
    invocations: usize,

    /// Maximum invocations in flight.
    #[arg(short = 'j', long, default_value_t = 8)]
    concurrency: usize,

    /// Share of createUser calls that fail.
    #[arg(long, default_value_t = 0.1)]
    failure_rate: f64,

    /// Reload operation metadata when the config file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => InstrumenterConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!("instrumenter v0.1.0 starting");

    tracing::info!(
        sink = ?config.sink.kind,
        operations = config.operations.len(),
        capture_arguments = config.instrument.capture_arguments,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut shutdown = Shutdown::new();
    let registry = Arc::new(ReloadableRegistry::from_config(&config.operations));

    let sink: Arc<dyn LogSink> = match config.sink.kind {
        SinkKind::Tracing => Arc::new(TracingSink),
        SinkKind::Channel => {
            let (sink, rx) = ChannelSink::new(config.sink.capacity);
            spawn_writer(&mut shutdown, rx, &config.sink.path).await?;
            Arc::new(sink)
        }
    };

    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            let handle = watcher.run()?;
            let registry = registry.clone();
            shutdown.spawn("config-reload", move |rx| apply_updates(updates, registry, rx));
            Some(handle)
        }
        (None, true) => {
            tracing::warn!("--watch needs --config, ignoring");
            None
        }
        _ => None,
    };

    let instrumenter = Instrumenter::new(sink, registry, config.instrument.clone());
    let service = Arc::new(demo::UserService::new(instrumenter.clone(), cli.failure_rate));

    let mut workload = JoinSet::new();
    tokio::select! {
        _ = demo::run_workload(service, &mut workload, cli.invocations, cli.concurrency) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, cancelling in-flight invocations");
        }
    }
    // Cancelled invocations must reach the sink before the writer stops.
    workload.shutdown().await;

    let aborted = shutdown.complete(Duration::from_secs(5)).await;
    if aborted > 0 {
        tracing::warn!(aborted, "Some background tasks were aborted");
    }

    println!("{}", serde_json::to_string_pretty(&instrumenter.stats())?);
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Start the JSON-lines writer for the channel sink.
async fn spawn_writer(
    shutdown: &mut Shutdown,
    rx: mpsc::Receiver<LogRecord>,
    path: &str,
) -> std::io::Result<()> {
    if path.is_empty() {
        let writer = SinkWriter::new(rx, tokio::io::stdout());
        shutdown.spawn("sink-writer", move |stop| async move {
            if let Err(e) = writer.run(stop).await {
                tracing::error!(error = %e, "Sink writer failed");
            }
        });
        return Ok(());
    }

    let file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(Path::new(path))
        .await?;
    tracing::info!(path = %path, "Appending invocation records");

    let writer = SinkWriter::new(rx, file);
    shutdown.spawn("sink-writer", move |stop| async move {
        if let Err(e) = writer.run(stop).await {
            tracing::error!(error = %e, "Sink writer failed");
        }
    });
    Ok(())
}
