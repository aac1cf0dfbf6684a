//! Event relay
//!
//! Feeds repository notifications to the listener one at a time. The reader
//! turns a JSON-lines source into envelopes; the listener loop drains the
//! channel until every sender is gone.

use crate::error::RelayError;
use crate::governance::audit::AuditCode;
use crate::governance::listener::GovernanceServerOmrsTopicListener;
use crate::governance::publisher::OutTopicConnector;
use crate::omrs::InstanceEventEnvelope;
use crate::registry::TypeHierarchy;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Counts from one run of the listener loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub received: usize,
    /// Events that produced a governance server event
    pub classified: usize,
    /// Classified events the out topic accepted
    pub published: usize,
}

/// Counts from reading an event source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub lines: usize,
    pub forwarded: usize,
    pub malformed: usize,
}

/// Deliver events to the listener until the channel closes
pub async fn run_listener<C, H>(
    listener: &GovernanceServerOmrsTopicListener<C, H>,
    mut events: mpsc::Receiver<InstanceEventEnvelope>,
) -> RelayStats
where
    C: OutTopicConnector,
    H: TypeHierarchy + Send + Sync + ?Sized,
{
    let audit = listener.audit().clone();
    audit
        .log(
            AuditCode::ListenerStarted,
            format!("The {} server is listening for repository events", listener.server_name()),
            None,
        )
        .await;

    let mut stats = RelayStats::default();
    while let Some(envelope) = events.recv().await {
        stats.received += 1;
        if let Some(dispatched) = listener.process_instance_event(&envelope).await {
            stats.classified += 1;
            if dispatched.published {
                stats.published += 1;
            }
        }
    }

    audit
        .log(
            AuditCode::ListenerStopped,
            format!(
                "The {} server stopped listening after {} events ({} classified, {} republished)",
                listener.server_name(),
                stats.received,
                stats.classified,
                stats.published
            ),
            Some(serde_json::json!({
                "received": stats.received,
                "classified": stats.classified,
                "published": stats.published,
            })),
        )
        .await;

    stats
}

/// Parse JSON-lines envelopes and forward them. Blank lines are skipped and
/// malformed lines are logged and dropped; stops early if the receiver goes.
pub async fn read_event_lines<R>(
    reader: R,
    sender: mpsc::Sender<InstanceEventEnvelope>,
) -> Result<ReadStats, RelayError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = ReadStats::default();

    while let Some(line) = lines.next_line().await? {
        stats.lines += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let envelope: InstanceEventEnvelope = match serde_json::from_str(line) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Skipping malformed event on line {}: {}", stats.lines, e);
                stats.malformed += 1;
                continue;
            }
        };

        if sender.send(envelope).await.is_err() {
            warn!("Listener has stopped; no further events will be read");
            break;
        }
        stats.forwarded += 1;
    }

    info!(
        "Read {} lines: {} events forwarded, {} malformed",
        stats.lines, stats.forwarded, stats.malformed
    );
    Ok(stats)
}
