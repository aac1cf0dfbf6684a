//! Mapping objects
//!
//! A mapping knows how one internal open metadata type corresponds to the
//! asset types of the external system. The stores only ever hold these
//! behind `Arc<dyn ...>` so connectors can supply their own implementations.

use crate::error::MappingError;
use crate::omrs::{InstanceProperties, PropertyValue};
use crate::types::TypeDef;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;

/// Wildcard accepted wherever an external asset type is expected
pub const ALL_ASSET_TYPES: &str = "*";

static EXTERNAL_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*$").expect("external type pattern is valid")
});

/// Check an external asset type identifier
pub fn is_valid_external_type(name: &str) -> bool {
    name == ALL_ASSET_TYPES || EXTERNAL_TYPE_RE.is_match(name)
}

/// One external property feeding one internal attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMapping {
    pub external_property: String,
    pub omrs_attribute: String,
}

impl PropertyMapping {
    pub fn new(external_property: impl Into<String>, omrs_attribute: impl Into<String>) -> Self {
        Self {
            external_property: external_property.into(),
            omrs_attribute: omrs_attribute.into(),
        }
    }
}

// =============================================================================
// ENTITY MAPPINGS
// =============================================================================

pub trait EntityMapping: Send + Sync + fmt::Debug {
    /// Internal type this mapping produces
    fn omrs_type_name(&self) -> &str;

    /// Primary external asset type
    fn external_asset_type(&self) -> &str;

    fn external_display_name(&self) -> &str;

    /// Prefix distinguishing entities generated from the same external asset
    fn rid_prefix(&self) -> Option<&str>;

    /// Further external types that also map onto this internal type
    fn other_external_types(&self) -> &[String];

    fn property_mappings(&self) -> &[PropertyMapping];

    /// Translate an external asset's properties into internal attributes
    fn map_external_properties(&self, external: &Map<String, Value>) -> InstanceProperties {
        let mut properties = InstanceProperties::new();
        for mapping in self.property_mappings() {
            match external.get(&mapping.external_property) {
                Some(Value::Null) | None => {}
                Some(value) => {
                    properties.insert(&mapping.omrs_attribute, PropertyValue::Primitive(value.clone()))
                }
            }
        }
        properties
    }

    /// Every external type this mapping answers for, primary first
    fn all_external_types(&self) -> Vec<&str> {
        let mut types = vec![self.external_asset_type()];
        for other in self.other_external_types() {
            if !types.contains(&other.as_str()) {
                types.push(other);
            }
        }
        types
    }
}

/// Data-driven entity mapping
#[derive(Debug, Clone)]
pub struct BasicEntityMapping {
    omrs_type_name: String,
    external_asset_type: String,
    external_display_name: String,
    rid_prefix: Option<String>,
    other_external_types: Vec<String>,
    property_mappings: Vec<PropertyMapping>,
}

impl BasicEntityMapping {
    pub fn new(omrs_type_name: impl Into<String>, external_asset_type: impl Into<String>) -> Self {
        let external_asset_type = external_asset_type.into();
        Self {
            omrs_type_name: omrs_type_name.into(),
            external_display_name: display_name_for(&external_asset_type),
            external_asset_type,
            rid_prefix: None,
            other_external_types: Vec::new(),
            property_mappings: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.external_display_name = display_name.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.rid_prefix = Some(prefix.into());
        self
    }

    pub fn with_other_type(mut self, external_type: impl Into<String>) -> Self {
        self.other_external_types.push(external_type.into());
        self
    }

    pub fn with_property(mut self, external: impl Into<String>, omrs: impl Into<String>) -> Self {
        self.property_mappings.push(PropertyMapping::new(external, omrs));
        self
    }
}

impl EntityMapping for BasicEntityMapping {
    fn omrs_type_name(&self) -> &str {
        &self.omrs_type_name
    }

    fn external_asset_type(&self) -> &str {
        &self.external_asset_type
    }

    fn external_display_name(&self) -> &str {
        &self.external_display_name
    }

    fn rid_prefix(&self) -> Option<&str> {
        self.rid_prefix.as_deref()
    }

    fn other_external_types(&self) -> &[String] {
        &self.other_external_types
    }

    fn property_mappings(&self) -> &[PropertyMapping] {
        &self.property_mappings
    }
}

/// "database_column" -> "Database Column"
fn display_name_for(external_type: &str) -> String {
    external_type
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check an entity mapping against the type definition it is registered for
pub fn validate_entity_mapping(type_def: &TypeDef, mapping: &dyn EntityMapping) -> Result<(), MappingError> {
    if mapping.omrs_type_name() != type_def.name {
        return Err(MappingError::invalid(
            &type_def.name,
            format!("mapping produces type {}", mapping.omrs_type_name()),
        ));
    }
    for external in mapping.all_external_types() {
        if external == ALL_ASSET_TYPES || !is_valid_external_type(external) {
            return Err(MappingError::invalid(
                &type_def.name,
                format!("bad external asset type '{}'", external),
            ));
        }
    }
    Ok(())
}

// =============================================================================
// RELATIONSHIP MAPPINGS
// =============================================================================

/// How one end of a relationship is found in the external system
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyMapping {
    /// External asset types that can sit at this end
    pub external_types: Vec<String>,
    /// External properties through which this end points at the other
    pub external_properties: Vec<String>,
}

impl ProxyMapping {
    pub fn new(external_type: impl Into<String>) -> Self {
        Self {
            external_types: vec![external_type.into()],
            external_properties: Vec::new(),
        }
    }

    pub fn with_type(mut self, external_type: impl Into<String>) -> Self {
        self.external_types.push(external_type.into());
        self
    }

    pub fn via(mut self, external_property: impl Into<String>) -> Self {
        self.external_properties.push(external_property.into());
        self
    }

    pub fn accepts(&self, external_type: &str) -> bool {
        self.external_types
            .iter()
            .any(|t| t == ALL_ASSET_TYPES || t == external_type)
    }
}

pub trait RelationshipMapping: Send + Sync + fmt::Debug {
    fn omrs_type_name(&self) -> &str;

    fn proxy_one(&self) -> &ProxyMapping;

    fn proxy_two(&self) -> &ProxyMapping;

    /// Narrower mappings tried when this one does not match directly
    fn sub_mappings(&self) -> &[std::sync::Arc<dyn RelationshipMapping>];

    /// External asset type that represents the relationship itself
    fn relationship_level_asset_type(&self) -> Option<&str>;

    /// True when this mapping answers for a property linking the two types,
    /// in either orientation
    fn matches_endpoints(&self, external_property: &str, type_a: &str, type_b: &str) -> bool {
        let one = self.proxy_one();
        let two = self.proxy_two();

        let via = one.external_properties.iter().any(|p| p == external_property)
            || two.external_properties.iter().any(|p| p == external_property);
        if !via {
            return false;
        }

        (one.accepts(type_a) && two.accepts(type_b)) || (one.accepts(type_b) && two.accepts(type_a))
    }

    /// Relationship-level asset match: both endpoints are the linking asset
    fn matches_relationship_asset(&self, external_property: &str, type_a: &str, type_b: &str) -> bool {
        match self.relationship_level_asset_type() {
            Some(asset) if asset == type_a && asset == type_b => {
                self.proxy_one().external_properties.iter().any(|p| p == external_property)
                    || self.proxy_two().external_properties.iter().any(|p| p == external_property)
            }
            _ => false,
        }
    }
}

/// Data-driven relationship mapping
#[derive(Debug, Clone)]
pub struct BasicRelationshipMapping {
    omrs_type_name: String,
    proxy_one: ProxyMapping,
    proxy_two: ProxyMapping,
    sub_mappings: Vec<std::sync::Arc<dyn RelationshipMapping>>,
    relationship_level_asset_type: Option<String>,
}

impl BasicRelationshipMapping {
    pub fn new(omrs_type_name: impl Into<String>, proxy_one: ProxyMapping, proxy_two: ProxyMapping) -> Self {
        Self {
            omrs_type_name: omrs_type_name.into(),
            proxy_one,
            proxy_two,
            sub_mappings: Vec::new(),
            relationship_level_asset_type: None,
        }
    }

    pub fn with_sub_mapping(mut self, sub: impl RelationshipMapping + 'static) -> Self {
        self.sub_mappings.push(std::sync::Arc::new(sub));
        self
    }

    pub fn with_relationship_asset(mut self, asset_type: impl Into<String>) -> Self {
        self.relationship_level_asset_type = Some(asset_type.into());
        self
    }
}

impl RelationshipMapping for BasicRelationshipMapping {
    fn omrs_type_name(&self) -> &str {
        &self.omrs_type_name
    }

    fn proxy_one(&self) -> &ProxyMapping {
        &self.proxy_one
    }

    fn proxy_two(&self) -> &ProxyMapping {
        &self.proxy_two
    }

    fn sub_mappings(&self) -> &[std::sync::Arc<dyn RelationshipMapping>] {
        &self.sub_mappings
    }

    fn relationship_level_asset_type(&self) -> Option<&str> {
        self.relationship_level_asset_type.as_deref()
    }
}

pub fn validate_relationship_mapping(
    type_def: &TypeDef,
    mapping: &dyn RelationshipMapping,
) -> Result<(), MappingError> {
    if mapping.omrs_type_name() != type_def.name {
        return Err(MappingError::invalid(
            &type_def.name,
            format!("mapping produces type {}", mapping.omrs_type_name()),
        ));
    }
    for (end, proxy) in [("one", mapping.proxy_one()), ("two", mapping.proxy_two())] {
        if proxy.external_types.is_empty() {
            return Err(MappingError::invalid(
                &type_def.name,
                format!("proxy {} names no external type", end),
            ));
        }
        if let Some(bad) = proxy.external_types.iter().find(|t| !is_valid_external_type(t)) {
            return Err(MappingError::invalid(
                &type_def.name,
                format!("bad external asset type '{}' on proxy {}", bad, end),
            ));
        }
    }
    for (position, sub) in mapping.sub_mappings().iter().enumerate() {
        validate_relationship_mapping(type_def, sub.as_ref()).map_err(|e| match e {
            MappingError::Invalid { reason, .. } => {
                MappingError::invalid(&type_def.name, format!("sub-mapping {}: {}", position, reason))
            }
            other => other,
        })?;
    }
    Ok(())
}

// =============================================================================
// CLASSIFICATION MAPPINGS
// =============================================================================

pub trait ClassificationMapping: Send + Sync + fmt::Debug {
    fn omrs_type_name(&self) -> &str;

    /// External asset types the classification can be applied to
    fn external_asset_types(&self) -> &[String];

    /// External property whose value drives the classification
    fn external_property(&self) -> Option<&str>;

    /// Values of the external property that mean "classified"; empty means any
    fn matching_values(&self) -> &[String];

    fn applies_to(&self, external_type: &str) -> bool {
        self.external_asset_types()
            .iter()
            .any(|t| t == ALL_ASSET_TYPES || t == external_type)
    }
}

#[derive(Debug, Clone)]
pub struct BasicClassificationMapping {
    omrs_type_name: String,
    external_asset_types: Vec<String>,
    external_property: Option<String>,
    matching_values: Vec<String>,
}

impl BasicClassificationMapping {
    pub fn new(omrs_type_name: impl Into<String>) -> Self {
        Self {
            omrs_type_name: omrs_type_name.into(),
            external_asset_types: Vec::new(),
            external_property: None,
            matching_values: Vec::new(),
        }
    }

    pub fn for_type(mut self, external_type: impl Into<String>) -> Self {
        self.external_asset_types.push(external_type.into());
        self
    }

    pub fn from_property(mut self, property: impl Into<String>) -> Self {
        self.external_property = Some(property.into());
        self
    }

    pub fn when_value(mut self, value: impl Into<String>) -> Self {
        self.matching_values.push(value.into());
        self
    }
}

impl ClassificationMapping for BasicClassificationMapping {
    fn omrs_type_name(&self) -> &str {
        &self.omrs_type_name
    }

    fn external_asset_types(&self) -> &[String] {
        &self.external_asset_types
    }

    fn external_property(&self) -> Option<&str> {
        self.external_property.as_deref()
    }

    fn matching_values(&self) -> &[String] {
        &self.matching_values
    }
}

pub fn validate_classification_mapping(
    type_def: &TypeDef,
    mapping: &dyn ClassificationMapping,
) -> Result<(), MappingError> {
    if mapping.omrs_type_name() != type_def.name {
        return Err(MappingError::invalid(
            &type_def.name,
            format!("mapping produces type {}", mapping.omrs_type_name()),
        ));
    }
    if mapping.external_asset_types().is_empty() {
        return Err(MappingError::invalid(&type_def.name, "no external asset types"));
    }
    if let Some(bad) = mapping
        .external_asset_types()
        .iter()
        .find(|t| !is_valid_external_type(t))
    {
        return Err(MappingError::invalid(
            &type_def.name,
            format!("bad external asset type '{}'", bad),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDefCategory;
    use serde_json::json;

    #[test]
    fn test_display_name_derived_from_external_type() {
        let mapping = BasicEntityMapping::new("RelationalColumn", "database_column");
        assert_eq!(mapping.external_display_name(), "Database Column");
    }

    #[test]
    fn test_map_external_properties_skips_missing_and_null() {
        let mapping = BasicEntityMapping::new("GlossaryTerm", "term")
            .with_property("name", "displayName")
            .with_property("short_description", "summary")
            .with_property("long_description", "description");

        let external = json!({ "name": "Customer", "short_description": null, "unmapped": 1 });
        let props = mapping.map_external_properties(external.as_object().unwrap());

        assert_eq!(props.len(), 1);
        assert_eq!(props.get_str("displayName"), Some("Customer"));
    }

    #[test]
    fn test_all_external_types_deduplicates() {
        let mapping = BasicEntityMapping::new("DataFile", "data_file")
            .with_other_type("data_file")
            .with_other_type("data_file_record");
        assert_eq!(mapping.all_external_types(), vec!["data_file", "data_file_record"]);
    }

    #[test]
    fn test_entity_mapping_for_wrong_type_is_invalid() {
        let type_def = TypeDef::new("g-1", "GlossaryTerm", TypeDefCategory::Entity);
        let mapping = BasicEntityMapping::new("GlossaryCategory", "category");
        assert!(matches!(
            validate_entity_mapping(&type_def, &mapping),
            Err(MappingError::Invalid { .. })
        ));
    }

    #[test]
    fn test_entity_mapping_rejects_bad_external_type() {
        let type_def = TypeDef::new("g-1", "GlossaryTerm", TypeDefCategory::Entity);
        assert!(validate_entity_mapping(&type_def, &BasicEntityMapping::new("GlossaryTerm", "Term Asset")).is_err());
        assert!(validate_entity_mapping(&type_def, &BasicEntityMapping::new("GlossaryTerm", "*")).is_err());
        assert!(validate_entity_mapping(&type_def, &BasicEntityMapping::new("GlossaryTerm", "term")).is_ok());
    }

    #[test]
    fn test_relationship_matches_either_orientation() {
        let mapping = BasicRelationshipMapping::new(
            "SemanticAssignment",
            ProxyMapping::new("database_column").via("assigned_to_terms"),
            ProxyMapping::new("term").via("assigned_assets"),
        );

        assert!(mapping.matches_endpoints("assigned_to_terms", "database_column", "term"));
        assert!(mapping.matches_endpoints("assigned_assets", "term", "database_column"));
        assert!(!mapping.matches_endpoints("parent_category", "database_column", "term"));
        assert!(!mapping.matches_endpoints("assigned_to_terms", "database_table", "term"));
    }

    #[test]
    fn test_wildcard_proxy_accepts_any_type() {
        let proxy = ProxyMapping::new(ALL_ASSET_TYPES);
        assert!(proxy.accepts("database_table"));
        assert!(proxy.accepts("term"));
    }

    #[test]
    fn test_relationship_asset_match_requires_both_ends() {
        let mapping = BasicRelationshipMapping::new(
            "RelatedTerm",
            ProxyMapping::new("term").via("related_terms"),
            ProxyMapping::new("term").via("related_terms"),
        )
        .with_relationship_asset("term_relationship");

        assert!(mapping.matches_relationship_asset("related_terms", "term_relationship", "term_relationship"));
        assert!(!mapping.matches_relationship_asset("related_terms", "term_relationship", "term"));
    }

    #[test]
    fn test_invalid_sub_mapping_rejects_parent() {
        let type_def = TypeDef::new("r-afs", "AttributeForSchema", TypeDefCategory::Relationship);
        let parent = || {
            BasicRelationshipMapping::new(
                "AttributeForSchema",
                ProxyMapping::new("database_schema").via("database_tables"),
                ProxyMapping::new("database_table"),
            )
        };

        let bad_proxy = parent().with_sub_mapping(BasicRelationshipMapping::new(
            "AttributeForSchema",
            ProxyMapping::new("Database Table").via("database_columns"),
            ProxyMapping::new("database_column"),
        ));
        assert_eq!(
            validate_relationship_mapping(&type_def, &bad_proxy),
            Err(MappingError::invalid(
                "AttributeForSchema",
                "sub-mapping 0: bad external asset type 'Database Table' on proxy one"
            ))
        );

        let wrong_type = parent().with_sub_mapping(BasicRelationshipMapping::new(
            "SchemaAttribute",
            ProxyMapping::new("database_table"),
            ProxyMapping::new("database_column"),
        ));
        assert!(validate_relationship_mapping(&type_def, &wrong_type).is_err());

        let valid = parent().with_sub_mapping(BasicRelationshipMapping::new(
            "AttributeForSchema",
            ProxyMapping::new("database_table").via("database_columns"),
            ProxyMapping::new("database_column"),
        ));
        assert!(validate_relationship_mapping(&type_def, &valid).is_ok());
    }

    #[test]
    fn test_classification_mapping_needs_asset_types() {
        let type_def = TypeDef::new("c-1", "Confidentiality", TypeDefCategory::Classification);
        assert!(validate_classification_mapping(&type_def, &BasicClassificationMapping::new("Confidentiality")).is_err());

        let mapping = BasicClassificationMapping::new("Confidentiality").for_type(ALL_ASSET_TYPES);
        assert!(validate_classification_mapping(&type_def, &mapping).is_ok());
        assert!(mapping.applies_to("database_column"));
    }
}
