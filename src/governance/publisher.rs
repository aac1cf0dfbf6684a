//! Out topic publisher
//!
//! Wraps the outbound transport. Publishing never fails from the caller's
//! point of view: transport errors are logged, audited and dropped here so
//! they cannot reach the shared event-processing loop.

use crate::error::PublishError;
use crate::governance::audit::{AuditCode, AuditLog};
use crate::governance::events::{GovernanceServerEvent, OutTopicEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error};

/// Outbound transport for out topic events
pub trait OutTopicConnector: Send + Sync {
    fn send(&self, event: &OutTopicEvent) -> Result<(), PublishError>;
}

/// Connector backed by a bounded channel; never waits for capacity
#[derive(Debug, Clone)]
pub struct ChannelConnector {
    sender: mpsc::Sender<OutTopicEvent>,
}

impl ChannelConnector {
    pub fn new(sender: mpsc::Sender<OutTopicEvent>) -> Self {
        Self { sender }
    }

    /// Create a connector together with the receiving end of its channel.
    /// A capacity of zero is raised to one.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OutTopicEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(sender), receiver)
    }
}

impl OutTopicConnector for ChannelConnector {
    fn send(&self, event: &OutTopicEvent) -> Result<(), PublishError> {
        self.sender.try_send(event.clone()).map_err(|e| match e {
            TrySendError::Full(_) => PublishError::ChannelFull(self.sender.max_capacity()),
            TrySendError::Closed(_) => PublishError::ChannelClosed,
        })
    }
}

impl<C: OutTopicConnector + ?Sized> OutTopicConnector for Arc<C> {
    fn send(&self, event: &OutTopicEvent) -> Result<(), PublishError> {
        (**self).send(event)
    }
}

/// Publishes governance server events onto the out topic
pub struct GovernanceServerOutTopicPublisher<C> {
    connector: C,
    server_name: String,
    audit: Arc<AuditLog>,
}

impl<C: OutTopicConnector> GovernanceServerOutTopicPublisher<C> {
    pub fn new(connector: C, server_name: impl Into<String>, audit: Arc<AuditLog>) -> Self {
        Self {
            connector,
            server_name: server_name.into(),
            audit,
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Send one event. Returns whether the transport accepted it; failures
    /// are already logged and audited when this returns false.
    pub async fn publish(&self, event: GovernanceServerEvent) -> bool {
        let out = OutTopicEvent::new(&self.server_name, event);

        match self.connector.send(&out) {
            Ok(()) => {
                debug!("Published {} ({}) to out topic", out.event.name(), out.id);
                true
            }
            Err(e) => {
                error!("Unable to publish {} to out topic: {}", out.event.name(), e);
                self.audit
                    .log(
                        AuditCode::OutTopicFailure,
                        format!(
                            "The {} server was unable to send a {} event to its out topic: {}",
                            self.server_name,
                            out.event.name(),
                            e
                        ),
                        Some(serde_json::json!({
                            "errorKind": e.kind(),
                            "errorMessage": e.to_string(),
                            "eventType": out.event.name(),
                            "eventId": out.id,
                            "elementGuids": out.event.element_guids(),
                        })),
                    )
                    .await;
                false
            }
        }
    }
}
