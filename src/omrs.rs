//! Repository instances and change events
//!
//! The shapes of the notifications the repository event bus delivers:
//! entities, lightweight entity proxies, relationships, and the instance
//! events that wrap them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const QUALIFIED_NAME: &str = "qualifiedName";

/// Type information carried by every instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceType {
    pub type_def_guid: String,
    pub type_def_name: String,
}

impl InstanceType {
    pub fn new(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_def_guid: guid.into(),
            type_def_name: name.into(),
        }
    }
}

/// A single property value: either an enum value or a primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Enum {
        ordinal: i32,
        #[serde(rename = "symbolicName")]
        symbolic_name: String,
    },
    Primitive(serde_json::Value),
}

impl PropertyValue {
    pub fn string(value: impl Into<String>) -> Self {
        PropertyValue::Primitive(serde_json::Value::String(value.into()))
    }

    pub fn enumeration(ordinal: i32, symbolic_name: impl Into<String>) -> Self {
        PropertyValue::Enum {
            ordinal,
            symbolic_name: symbolic_name.into(),
        }
    }

    /// String form of the value; symbolic name for enums
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Enum { symbolic_name, .. } => Some(symbolic_name),
            PropertyValue::Primitive(value) => value.as_str(),
        }
    }
}

/// Named properties of an instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceProperties(BTreeMap<String, PropertyValue>);

impl InstanceProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropertyValue::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A classification attached to an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub name: String,
    #[serde(default)]
    pub properties: InstanceProperties,
}

/// Full entity instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDetail {
    pub guid: String,
    #[serde(default)]
    pub instance_type: Option<InstanceType>,
    #[serde(default)]
    pub properties: InstanceProperties,
    #[serde(default)]
    pub classifications: Vec<Classification>,
}

/// Lightweight reference to an entity, carrying only its unique properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityProxy {
    pub guid: String,
    #[serde(default)]
    pub instance_type: Option<InstanceType>,
    #[serde(default)]
    pub unique_properties: InstanceProperties,
}

/// Relationship instance linking two entity proxies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub guid: String,
    #[serde(default)]
    pub instance_type: Option<InstanceType>,
    #[serde(default)]
    pub properties: InstanceProperties,
    #[serde(default)]
    pub entity_one_proxy: Option<EntityProxy>,
    #[serde(default)]
    pub entity_two_proxy: Option<EntityProxy>,
}

/// Common view over entities, proxies and relationships so the same
/// type-matching logic applies to each of them
pub trait HasTypeAndProperties {
    fn guid(&self) -> &str;
    fn instance_type(&self) -> Option<&InstanceType>;
    fn properties(&self) -> &InstanceProperties;

    fn type_name(&self) -> Option<&str> {
        self.instance_type()
            .map(|t| t.type_def_name.as_str())
            .filter(|name| !name.is_empty())
    }

    fn property_str(&self, name: &str) -> Option<&str> {
        self.properties().get_str(name)
    }

    fn qualified_name(&self) -> Option<&str> {
        self.property_str(QUALIFIED_NAME)
    }
}

impl HasTypeAndProperties for EntityDetail {
    fn guid(&self) -> &str {
        &self.guid
    }

    fn instance_type(&self) -> Option<&InstanceType> {
        self.instance_type.as_ref()
    }

    fn properties(&self) -> &InstanceProperties {
        &self.properties
    }
}

impl HasTypeAndProperties for EntityProxy {
    fn guid(&self) -> &str {
        &self.guid
    }

    fn instance_type(&self) -> Option<&InstanceType> {
        self.instance_type.as_ref()
    }

    fn properties(&self) -> &InstanceProperties {
        &self.unique_properties
    }
}

impl HasTypeAndProperties for Relationship {
    fn guid(&self) -> &str {
        &self.guid
    }

    fn instance_type(&self) -> Option<&InstanceType> {
        self.instance_type.as_ref()
    }

    fn properties(&self) -> &InstanceProperties {
        &self.properties
    }
}

/// Repository change notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum InstanceEvent {
    #[serde(rename = "NEW_ENTITY_EVENT")]
    NewEntity { entity: EntityDetail },

    #[serde(rename = "UPDATED_ENTITY_EVENT", rename_all = "camelCase")]
    UpdatedEntity {
        #[serde(default)]
        original_entity: Option<EntityDetail>,
        entity: EntityDetail,
    },

    #[serde(rename = "DELETED_ENTITY_EVENT")]
    DeletedEntity { entity: EntityDetail },

    #[serde(rename = "RESTORED_ENTITY_EVENT")]
    RestoredEntity { entity: EntityDetail },

    #[serde(rename = "CLASSIFIED_ENTITY_EVENT")]
    ClassifiedEntity { entity: EntityDetail },

    #[serde(rename = "RECLASSIFIED_ENTITY_EVENT")]
    ReclassifiedEntity { entity: EntityDetail },

    #[serde(rename = "DECLASSIFIED_ENTITY_EVENT")]
    DeclassifiedEntity { entity: EntityDetail },

    #[serde(rename = "PURGED_ENTITY_EVENT", rename_all = "camelCase")]
    PurgedEntity {
        type_def_guid: String,
        type_def_name: String,
        instance_guid: String,
    },

    #[serde(rename = "NEW_RELATIONSHIP_EVENT")]
    NewRelationship { relationship: Relationship },

    #[serde(rename = "UPDATED_RELATIONSHIP_EVENT", rename_all = "camelCase")]
    UpdatedRelationship {
        #[serde(default)]
        original_relationship: Option<Relationship>,
        relationship: Relationship,
    },

    #[serde(rename = "DELETED_RELATIONSHIP_EVENT")]
    DeletedRelationship { relationship: Relationship },

    #[serde(rename = "RESTORED_RELATIONSHIP_EVENT")]
    RestoredRelationship { relationship: Relationship },

    #[serde(rename = "PURGED_RELATIONSHIP_EVENT", rename_all = "camelCase")]
    PurgedRelationship {
        type_def_guid: String,
        type_def_name: String,
        instance_guid: String,
    },
}

/// Flat tag for an instance event, used in logs and audit details
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceEventKind {
    NewEntity,
    UpdatedEntity,
    DeletedEntity,
    RestoredEntity,
    ClassifiedEntity,
    ReclassifiedEntity,
    DeclassifiedEntity,
    PurgedEntity,
    NewRelationship,
    UpdatedRelationship,
    DeletedRelationship,
    RestoredRelationship,
    PurgedRelationship,
}

impl InstanceEventKind {
    /// True for events that report an element going away
    pub fn is_removal(self) -> bool {
        matches!(
            self,
            InstanceEventKind::DeletedEntity
                | InstanceEventKind::PurgedEntity
                | InstanceEventKind::DeletedRelationship
                | InstanceEventKind::PurgedRelationship
        )
    }
}

impl fmt::Display for InstanceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl InstanceEvent {
    pub fn kind(&self) -> InstanceEventKind {
        match self {
            InstanceEvent::NewEntity { .. } => InstanceEventKind::NewEntity,
            InstanceEvent::UpdatedEntity { .. } => InstanceEventKind::UpdatedEntity,
            InstanceEvent::DeletedEntity { .. } => InstanceEventKind::DeletedEntity,
            InstanceEvent::RestoredEntity { .. } => InstanceEventKind::RestoredEntity,
            InstanceEvent::ClassifiedEntity { .. } => InstanceEventKind::ClassifiedEntity,
            InstanceEvent::ReclassifiedEntity { .. } => InstanceEventKind::ReclassifiedEntity,
            InstanceEvent::DeclassifiedEntity { .. } => InstanceEventKind::DeclassifiedEntity,
            InstanceEvent::PurgedEntity { .. } => InstanceEventKind::PurgedEntity,
            InstanceEvent::NewRelationship { .. } => InstanceEventKind::NewRelationship,
            InstanceEvent::UpdatedRelationship { .. } => InstanceEventKind::UpdatedRelationship,
            InstanceEvent::DeletedRelationship { .. } => InstanceEventKind::DeletedRelationship,
            InstanceEvent::RestoredRelationship { .. } => InstanceEventKind::RestoredRelationship,
            InstanceEvent::PurgedRelationship { .. } => InstanceEventKind::PurgedRelationship,
        }
    }

    /// The entity an entity-oriented event carries (current state for updates)
    pub fn entity(&self) -> Option<&EntityDetail> {
        match self {
            InstanceEvent::NewEntity { entity }
            | InstanceEvent::UpdatedEntity { entity, .. }
            | InstanceEvent::DeletedEntity { entity }
            | InstanceEvent::RestoredEntity { entity }
            | InstanceEvent::ClassifiedEntity { entity }
            | InstanceEvent::ReclassifiedEntity { entity }
            | InstanceEvent::DeclassifiedEntity { entity } => Some(entity),
            _ => None,
        }
    }

    /// The relationship a relationship-oriented event carries
    pub fn relationship(&self) -> Option<&Relationship> {
        match self {
            InstanceEvent::NewRelationship { relationship }
            | InstanceEvent::UpdatedRelationship { relationship, .. }
            | InstanceEvent::DeletedRelationship { relationship }
            | InstanceEvent::RestoredRelationship { relationship } => Some(relationship),
            _ => None,
        }
    }
}

/// Where an event came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOriginator {
    #[serde(default)]
    pub server_name: Option<String>,
    #[serde(default)]
    pub metadata_collection_id: Option<String>,
}

/// One inbound notification as delivered by the event bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceEventEnvelope {
    #[serde(default)]
    pub originator: EventOriginator,
    pub event: InstanceEvent,
}

impl InstanceEventEnvelope {
    pub fn new(event: InstanceEvent) -> Self {
        Self {
            originator: EventOriginator::default(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_property_reads_symbolic_name() {
        let json = r#"{ "actionStatus": { "ordinal": 1, "symbolicName": "APPROVED" }, "qualifiedName": "action-1" }"#;
        let props: InstanceProperties = serde_json::from_str(json).unwrap();

        assert_eq!(props.get_str("actionStatus"), Some("APPROVED"));
        assert_eq!(props.get_str("qualifiedName"), Some("action-1"));
        assert!(matches!(props.get("actionStatus"), Some(PropertyValue::Enum { ordinal: 1, .. })));
    }

    #[test]
    fn test_envelope_parses_updated_entity() {
        let line = r#"{
            "originator": { "serverName": "cocoMDS1" },
            "event": {
                "eventType": "UPDATED_ENTITY_EVENT",
                "entity": {
                    "guid": "e-1",
                    "instanceType": { "typeDefGuid": "t-1", "typeDefName": "GovernanceEngine" },
                    "properties": { "qualifiedName": "AssetGovernance" }
                }
            }
        }"#;

        let envelope: InstanceEventEnvelope = serde_json::from_str(line).unwrap();
        assert_eq!(envelope.originator.server_name.as_deref(), Some("cocoMDS1"));
        assert_eq!(envelope.event.kind(), InstanceEventKind::UpdatedEntity);

        let entity = envelope.event.entity().unwrap();
        assert_eq!(entity.type_name(), Some("GovernanceEngine"));
        assert_eq!(entity.qualified_name(), Some("AssetGovernance"));
    }

    #[test]
    fn test_proxy_reads_unique_properties() {
        let proxy = EntityProxy {
            guid: "p-1".to_string(),
            instance_type: Some(InstanceType::new("t", "GovernanceService")),
            unique_properties: InstanceProperties::new()
                .with(QUALIFIED_NAME, PropertyValue::string("svc")),
        };
        assert_eq!(proxy.qualified_name(), Some("svc"));
    }

    #[test]
    fn test_empty_type_name_is_missing() {
        let entity = EntityDetail {
            guid: "e".to_string(),
            instance_type: Some(InstanceType::new("", "")),
            properties: InstanceProperties::new(),
            classifications: vec![],
        };
        assert_eq!(entity.type_name(), None);
    }

    #[test]
    fn test_purge_has_no_payload() {
        let event = InstanceEvent::PurgedEntity {
            type_def_guid: "t".to_string(),
            type_def_name: "GovernanceEngine".to_string(),
            instance_guid: "g".to_string(),
        };
        assert!(event.entity().is_none());
        assert!(event.relationship().is_none());
        assert!(event.kind().is_removal());
    }
}
