//! Out topic event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Narrow, purpose-specific events the governance server publishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "camelCase")]
pub enum GovernanceServerEvent {
    #[serde(rename_all = "camelCase")]
    RefreshGovernanceEngine {
        governance_engine_guid: String,
        governance_engine_name: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    RefreshGovernanceService {
        governance_engine_guid: String,
        governance_engine_name: Option<String>,
        registered_governance_service_guid: String,
        request_type: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    NewAction {
        action_guid: String,
        action_name: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    CancelledAction {
        action_guid: String,
        action_name: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    RefreshIntegrationGroup {
        integration_group_guid: String,
        integration_group_name: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    RefreshIntegrationConnector {
        integration_group_guid: String,
        integration_group_name: Option<String>,
        integration_connector_guid: String,
        connector_name: Option<String>,
    },
}

impl GovernanceServerEvent {
    /// Stable event name, matching the serialized tag
    pub fn name(&self) -> &'static str {
        match self {
            GovernanceServerEvent::RefreshGovernanceEngine { .. } => "refreshGovernanceEngine",
            GovernanceServerEvent::RefreshGovernanceService { .. } => "refreshGovernanceService",
            GovernanceServerEvent::NewAction { .. } => "newAction",
            GovernanceServerEvent::CancelledAction { .. } => "cancelledAction",
            GovernanceServerEvent::RefreshIntegrationGroup { .. } => "refreshIntegrationGroup",
            GovernanceServerEvent::RefreshIntegrationConnector { .. } => "refreshIntegrationConnector",
        }
    }

    /// GUIDs of every element the event refers to
    pub fn element_guids(&self) -> Vec<&str> {
        match self {
            GovernanceServerEvent::RefreshGovernanceEngine { governance_engine_guid, .. } => {
                vec![governance_engine_guid.as_str()]
            }
            GovernanceServerEvent::RefreshGovernanceService {
                governance_engine_guid,
                registered_governance_service_guid,
                ..
            } => vec![governance_engine_guid.as_str(), registered_governance_service_guid.as_str()],
            GovernanceServerEvent::NewAction { action_guid, .. }
            | GovernanceServerEvent::CancelledAction { action_guid, .. } => vec![action_guid.as_str()],
            GovernanceServerEvent::RefreshIntegrationGroup { integration_group_guid, .. } => {
                vec![integration_group_guid.as_str()]
            }
            GovernanceServerEvent::RefreshIntegrationConnector {
                integration_group_guid,
                integration_connector_guid,
                ..
            } => vec![integration_group_guid.as_str(), integration_connector_guid.as_str()],
        }
    }
}

/// An event as it travels on the out topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutTopicEvent {
    pub id: Uuid,
    pub published_at: DateTime<Utc>,
    pub server_name: String,
    pub event: GovernanceServerEvent,
}

impl OutTopicEvent {
    pub fn new(server_name: impl Into<String>, event: GovernanceServerEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            published_at: Utc::now(),
            server_name: server_name.into(),
            event,
        }
    }
}
