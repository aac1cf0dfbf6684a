//! OMRS Relay
//!
//! Loads the type gallery into the mapping registry, then reads repository
//! instance events (JSON lines, from a file or stdin) and writes the
//! governance server events they produce to stdout as JSON lines.
//! Logs go to stderr.

use omrs_relay::config::{LogFormat, Settings};
use omrs_relay::error::RelayError;
use omrs_relay::governance::{
    read_event_lines, run_listener, AuditCode, ChannelConnector, GovernanceServerOmrsTopicListener,
    GovernanceServerOutTopicPublisher, OutTopicEvent, ReadStats,
};
use omrs_relay::omrs::InstanceEventEnvelope;
use omrs_relay::registry::{load_gallery, RegistrationTable, RegistryBuilder};
use omrs_relay::state::{RelayState, SharedState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How long shutdown waits for blocking tasks. A stdin read cannot be
/// cancelled, so the runtime must not wait on it indefinitely.
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let result = runtime.block_on(run());
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);
    result
}

async fn run() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::load()?;

    // Initialize tracing subscriber for structured logging
    init_tracing(settings.log_format);

    info!("Starting OMRS relay for server {}", settings.server_name);

    let gallery = load_gallery(&settings.types_file)?;
    let registry = RegistryBuilder::new(settings.max_supertype_depth)
        .populate(gallery, &RegistrationTable::with_defaults())?
        .build()?;

    let state: SharedState = Arc::new(RelayState::new(settings, registry));
    let report = state.registry.report();
    state
        .audit
        .log(
            AuditCode::RegistryLoaded,
            format!(
                "The {} server loaded {} type definitions ({} mapped, {} unmapped, {} failed)",
                state.settings.server_name, report.type_defs, report.mapped, report.unmapped, report.failed
            ),
            Some(serde_json::json!({
                "typeDefs": report.type_defs,
                "mapped": report.mapped,
                "unmapped": report.unmapped,
                "failed": report.failed,
                "unimplemented": state.registry.type_defs().unimplemented().collect::<Vec<_>>(),
            })),
        )
        .await;

    // Out topic: a bounded channel drained to stdout
    let (connector, out_events) = ChannelConnector::channel(state.settings.out_topic_capacity);
    let writer = tokio::spawn(write_out_topic(out_events));

    let publisher =
        GovernanceServerOutTopicPublisher::new(connector, state.settings.server_name.clone(), state.audit.clone());
    let listener = GovernanceServerOmrsTopicListener::new(publisher, state.registry.clone(), state.audit.clone());

    // In topic: JSON lines from the events file or stdin
    let (sender, receiver) = mpsc::channel(state.settings.out_topic_capacity);
    let events_file = state.settings.events_file.clone();
    let reader = tokio::spawn(read_events(events_file, sender));

    // Stopping the reader drops its sender, which lets the listener drain and finish
    let reader_abort = reader.abort_handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        reader_abort.abort();
    });

    let stats = run_listener(&listener, receiver).await;

    match reader.await {
        Ok(Ok(read)) if read.malformed > 0 => warn!("{} malformed event lines were skipped", read.malformed),
        Ok(Ok(_)) => {}
        Ok(Err(e)) => error!("Event source failed: {}", e),
        Err(e) if e.is_cancelled() => info!("Event source stopped by shutdown"),
        Err(e) => error!("Event reader task failed: {}", e),
    }

    // Dropping the listener closes the out topic so the writer can finish
    drop(listener);
    let written = writer.await??;

    info!(
        "Relay finished: {} events received, {} classified, {} republished, {} written, {} out topic failures",
        stats.received,
        stats.classified,
        stats.published,
        written,
        state.audit.count(AuditCode::OutTopicFailure).await
    );
    Ok(())
}

/// Initialize tracing with structured logging on stderr
fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,omrs_relay=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init(),
    }
}

/// Feed the listener from the events file, or stdin when none is configured
async fn read_events(
    events_file: Option<PathBuf>,
    sender: mpsc::Sender<InstanceEventEnvelope>,
) -> Result<ReadStats, RelayError> {
    match events_file {
        Some(path) => {
            info!("Reading instance events from {}", path.display());
            let file = tokio::fs::File::open(&path).await?;
            read_event_lines(BufReader::new(file), sender).await
        }
        None => {
            info!("Reading instance events from stdin");
            read_event_lines(BufReader::new(tokio::io::stdin()), sender).await
        }
    }
}

/// Write out topic events to stdout, one JSON document per line
async fn write_out_topic(mut events: mpsc::Receiver<OutTopicEvent>) -> std::io::Result<usize> {
    let mut stdout = tokio::io::stdout();
    let mut written = 0;

    while let Some(event) = events.recv().await {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                error!("Unable to serialize {} event: {}", event.event.name(), e);
                continue;
            }
        };
        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        written += 1;
    }

    stdout.flush().await?;
    Ok(written)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, stopping event intake...");
        },
        _ = terminate => {
            info!("Received terminate signal, stopping event intake...");
        },
    }
}
