//! Governance Server Event Relay
//!
//! Watches the repository event stream for changes to governance engines,
//! engine actions and integration groups, and republishes them as narrow
//! governance server events. This module provides:
//! - Out topic event types and publisher
//! - Ordered classification rules and the topic listener
//! - The audit log both of them write to
//! - A relay loop feeding notifications to the listener

pub mod audit;
pub mod events;
pub mod listener;
pub mod publisher;
pub mod relay;

pub use audit::{AuditCode, AuditEntry, AuditLog, AuditSeverity};
pub use events::{GovernanceServerEvent, OutTopicEvent};
pub use listener::{classify, ActionStatus, Dispatched, EntityRule, GovernanceServerOmrsTopicListener, RelationshipRule};
pub use publisher::{ChannelConnector, GovernanceServerOutTopicPublisher, OutTopicConnector};
pub use relay::{read_event_lines, run_listener, ReadStats, RelayStats};
