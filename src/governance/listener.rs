//! OMRS topic listener
//!
//! Classifies repository change notifications against a fixed, ordered list
//! of rules. The first rule that produces an event wins; anything no rule
//! recognises (including events with missing type information) is dropped
//! without an audit entry.

use crate::governance::audit::{AuditCode, AuditLog};
use crate::governance::events::GovernanceServerEvent;
use crate::governance::publisher::{GovernanceServerOutTopicPublisher, OutTopicConnector};
use crate::omrs::{HasTypeAndProperties, InstanceEvent, InstanceEventEnvelope, InstanceEventKind, Relationship};
use crate::registry::TypeHierarchy;
use std::sync::Arc;
use tracing::{debug, trace};

// ===== TYPE NAMES =====

pub const GOVERNANCE_ENGINE_TYPE: &str = "GovernanceEngine";
pub const GOVERNANCE_SERVICE_TYPE: &str = "GovernanceService";
pub const ENGINE_ACTION_TYPE: &str = "EngineAction";
pub const INTEGRATION_GROUP_TYPE: &str = "IntegrationGroup";
pub const INTEGRATION_CONNECTOR_TYPE: &str = "IntegrationConnector";
pub const SUPPORTED_GOVERNANCE_SERVICE_TYPE: &str = "SupportedGovernanceService";
pub const REGISTERED_INTEGRATION_CONNECTOR_TYPE: &str = "RegisteredIntegrationConnector";

pub const ACTION_STATUS_PROPERTY: &str = "actionStatus";
pub const REQUEST_TYPE_PROPERTY: &str = "requestType";
pub const CONNECTOR_NAME_PROPERTY: &str = "connectorName";

// ===== ACTION STATUS =====

/// Lifecycle status of an engine action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Requested,
    Approved,
    Waiting,
    Activating,
    InProgress,
    Completed,
    Invalid,
    Ignored,
    Failed,
    Cancelled,
    Other,
}

impl ActionStatus {
    /// Parse a symbolic status name; case and `-`/`_` are not significant
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_uppercase().replace('-', "_");
        let status = match normalized.as_str() {
            "REQUESTED" => ActionStatus::Requested,
            "APPROVED" => ActionStatus::Approved,
            "WAITING" => ActionStatus::Waiting,
            "ACTIVATING" => ActionStatus::Activating,
            "IN_PROGRESS" => ActionStatus::InProgress,
            "COMPLETED" => ActionStatus::Completed,
            "INVALID" => ActionStatus::Invalid,
            "IGNORED" => ActionStatus::Ignored,
            "FAILED" => ActionStatus::Failed,
            "CANCELLED" => ActionStatus::Cancelled,
            "OTHER" => ActionStatus::Other,
            _ => return None,
        };
        Some(status)
    }
}

// ===== RULES =====

/// Entity classification rules, evaluated in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRule {
    GovernanceEngine,
    EngineAction,
    IntegrationGroup,
}

impl EntityRule {
    pub const ORDERED: [EntityRule; 3] = [
        EntityRule::GovernanceEngine,
        EntityRule::EngineAction,
        EntityRule::IntegrationGroup,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            EntityRule::GovernanceEngine => GOVERNANCE_ENGINE_TYPE,
            EntityRule::EngineAction => ENGINE_ACTION_TYPE,
            EntityRule::IntegrationGroup => INTEGRATION_GROUP_TYPE,
        }
    }

    /// Removal of an action is not a status change
    pub fn applies_to(self, kind: InstanceEventKind) -> bool {
        match self {
            EntityRule::EngineAction => !kind.is_removal(),
            EntityRule::GovernanceEngine | EntityRule::IntegrationGroup => true,
        }
    }

    pub fn classify<E, H>(self, entity: &E, hierarchy: &H) -> Option<GovernanceServerEvent>
    where
        E: HasTypeAndProperties + ?Sized,
        H: TypeHierarchy + ?Sized,
    {
        let type_name = entity.type_name()?;
        if !hierarchy.is_type_of(type_name, self.type_name()) {
            return None;
        }

        let guid = entity.guid().to_string();
        let name = entity.qualified_name().map(str::to_string);

        match self {
            EntityRule::GovernanceEngine => Some(GovernanceServerEvent::RefreshGovernanceEngine {
                governance_engine_guid: guid,
                governance_engine_name: name,
            }),
            EntityRule::EngineAction => {
                let status = entity.property_str(ACTION_STATUS_PROPERTY).and_then(ActionStatus::parse)?;
                match status {
                    ActionStatus::Approved => Some(GovernanceServerEvent::NewAction {
                        action_guid: guid,
                        action_name: name,
                    }),
                    ActionStatus::Cancelled => Some(GovernanceServerEvent::CancelledAction {
                        action_guid: guid,
                        action_name: name,
                    }),
                    _ => None,
                }
            }
            EntityRule::IntegrationGroup => Some(GovernanceServerEvent::RefreshIntegrationGroup {
                integration_group_guid: guid,
                integration_group_name: name,
            }),
        }
    }
}

/// Relationship classification rules, evaluated in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipRule {
    SupportedGovernanceService,
    RegisteredIntegrationConnector,
}

impl RelationshipRule {
    pub const ORDERED: [RelationshipRule; 2] = [
        RelationshipRule::SupportedGovernanceService,
        RelationshipRule::RegisteredIntegrationConnector,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            RelationshipRule::SupportedGovernanceService => SUPPORTED_GOVERNANCE_SERVICE_TYPE,
            RelationshipRule::RegisteredIntegrationConnector => REGISTERED_INTEGRATION_CONNECTOR_TYPE,
        }
    }

    /// Expected types of end one and end two
    pub fn end_types(self) -> (&'static str, &'static str) {
        match self {
            RelationshipRule::SupportedGovernanceService => (GOVERNANCE_ENGINE_TYPE, GOVERNANCE_SERVICE_TYPE),
            RelationshipRule::RegisteredIntegrationConnector => {
                (INTEGRATION_GROUP_TYPE, INTEGRATION_CONNECTOR_TYPE)
            }
        }
    }

    /// Relationship property copied onto the outbound event
    pub fn carried_property(self) -> &'static str {
        match self {
            RelationshipRule::SupportedGovernanceService => REQUEST_TYPE_PROPERTY,
            RelationshipRule::RegisteredIntegrationConnector => CONNECTOR_NAME_PROPERTY,
        }
    }

    pub fn classify<H>(self, relationship: &Relationship, hierarchy: &H) -> Option<GovernanceServerEvent>
    where
        H: TypeHierarchy + ?Sized,
    {
        let type_name = relationship.type_name()?;
        if !hierarchy.is_type_of(type_name, self.type_name()) {
            return None;
        }

        let end_one = relationship.entity_one_proxy.as_ref()?;
        let end_two = relationship.entity_two_proxy.as_ref()?;
        let (end_one_type, end_two_type) = self.end_types();
        if !hierarchy.is_type_of(end_one.type_name()?, end_one_type)
            || !hierarchy.is_type_of(end_two.type_name()?, end_two_type)
        {
            return None;
        }

        let carried = relationship.property_str(self.carried_property()).map(str::to_string);

        match self {
            RelationshipRule::SupportedGovernanceService => Some(GovernanceServerEvent::RefreshGovernanceService {
                governance_engine_guid: end_one.guid.clone(),
                governance_engine_name: end_one.qualified_name().map(str::to_string),
                registered_governance_service_guid: end_two.guid.clone(),
                request_type: carried,
            }),
            RelationshipRule::RegisteredIntegrationConnector => {
                Some(GovernanceServerEvent::RefreshIntegrationConnector {
                    integration_group_guid: end_one.guid.clone(),
                    integration_group_name: end_one.qualified_name().map(str::to_string),
                    integration_connector_guid: end_two.guid.clone(),
                    connector_name: carried,
                })
            }
        }
    }
}

/// First entity rule that produces an event
pub fn classify_entity<E, H>(kind: InstanceEventKind, entity: &E, hierarchy: &H) -> Option<GovernanceServerEvent>
where
    E: HasTypeAndProperties + ?Sized,
    H: TypeHierarchy + ?Sized,
{
    EntityRule::ORDERED
        .iter()
        .filter(|rule| rule.applies_to(kind))
        .find_map(|rule| rule.classify(entity, hierarchy))
}

/// First relationship rule that produces an event
pub fn classify_relationship<H>(relationship: &Relationship, hierarchy: &H) -> Option<GovernanceServerEvent>
where
    H: TypeHierarchy + ?Sized,
{
    RelationshipRule::ORDERED
        .iter()
        .find_map(|rule| rule.classify(relationship, hierarchy))
}

/// Classify one repository event. Purge events carry no instance and are
/// never interesting.
pub fn classify<H>(event: &InstanceEvent, hierarchy: &H) -> Option<GovernanceServerEvent>
where
    H: TypeHierarchy + ?Sized,
{
    if let Some(entity) = event.entity() {
        return classify_entity(event.kind(), entity, hierarchy);
    }
    event
        .relationship()
        .and_then(|relationship| classify_relationship(relationship, hierarchy))
}

// ===== LISTENER =====

/// What the listener did with an interesting event
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub event: GovernanceServerEvent,
    /// False when the out topic connector rejected the event
    pub published: bool,
}

/// Receives repository events and republishes the interesting ones
pub struct GovernanceServerOmrsTopicListener<C, H: ?Sized> {
    publisher: GovernanceServerOutTopicPublisher<C>,
    hierarchy: Arc<H>,
    audit: Arc<AuditLog>,
}

impl<C, H> GovernanceServerOmrsTopicListener<C, H>
where
    C: OutTopicConnector,
    H: TypeHierarchy + Send + Sync + ?Sized,
{
    pub fn new(publisher: GovernanceServerOutTopicPublisher<C>, hierarchy: Arc<H>, audit: Arc<AuditLog>) -> Self {
        Self {
            publisher,
            hierarchy,
            audit,
        }
    }

    pub fn server_name(&self) -> &str {
        self.publisher.server_name()
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// Handle one notification. Never fails; returns the event that was
    /// handed to the publisher, if any, and whether the send succeeded.
    pub async fn process_instance_event(&self, envelope: &InstanceEventEnvelope) -> Option<Dispatched> {
        let kind = envelope.event.kind();

        let Some(event) = classify(&envelope.event, self.hierarchy.as_ref()) else {
            trace!("Ignoring {} event", kind);
            return None;
        };

        debug!("{} event classified as {}", kind, event.name());

        self.audit
            .log(
                AuditCode::InterestingEvent,
                format!(
                    "The {} server received a {} event and is sending a {} event to its out topic",
                    self.publisher.server_name(),
                    kind,
                    event.name()
                ),
                Some(serde_json::json!({
                    "instanceEvent": kind,
                    "eventType": event.name(),
                    "elementGuids": event.element_guids(),
                    "originator": envelope.originator.server_name,
                })),
            )
            .await;

        let published = self.publisher.publish(event.clone()).await;
        Some(Dispatched { event, published })
    }
}
