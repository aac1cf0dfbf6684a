//! Relationship Mapping Store

use crate::error::MappingError;
use crate::registry::index::MappingIndex;
use crate::registry::mapping::{validate_relationship_mapping, RelationshipMapping};
use crate::types::TypeDef;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Store for relationship mappings
#[derive(Debug, Default)]
pub struct RelationshipMappingStore {
    index: MappingIndex<dyn RelationshipMapping>,
}

impl RelationshipMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping with `factory` and store it; false if nothing was stored
    pub fn register<F>(&mut self, type_def: &TypeDef, factory: F) -> bool
    where
        F: FnOnce() -> Result<Arc<dyn RelationshipMapping>, MappingError>,
    {
        let mapping = match factory()
            .and_then(|m| validate_relationship_mapping(type_def, m.as_ref()).map(|_| m))
        {
            Ok(mapping) => mapping,
            Err(e) => {
                error!("Unable to register relationship mapping for {}: {}", type_def.name, e);
                return false;
            }
        };

        if !self.index.insert(type_def, mapping) {
            warn!("Relationship mapping for {} ({}) already registered", type_def.name, type_def.guid);
            return false;
        }
        debug!("Registered relationship mapping {}", type_def.name);
        true
    }

    pub fn lookup_by_internal_id(&self, guid: &str) -> Option<Arc<dyn RelationshipMapping>> {
        self.index.get(guid)
    }

    pub fn lookup_by_internal_name(&self, name: &str) -> Option<Arc<dyn RelationshipMapping>> {
        self.index.get_by_name(name)
    }

    /// Find the mapping for an external property linking two external asset
    /// types. Mappings are scanned in registration order; for each one the
    /// direct match is tried, then its sub-mappings, then a relationship-level
    /// asset match. The first hit wins.
    pub fn lookup_by_endpoint_types(
        &self,
        external_property: &str,
        type_a: &str,
        type_b: &str,
    ) -> Option<Arc<dyn RelationshipMapping>> {
        for mapping in self.index.iter() {
            if mapping.matches_endpoints(external_property, type_a, type_b) {
                return Some(mapping.clone());
            }
            if let Some(sub) = mapping
                .sub_mappings()
                .iter()
                .find(|sub| sub.matches_endpoints(external_property, type_a, type_b))
            {
                return Some(sub.clone());
            }
            if mapping.matches_relationship_asset(external_property, type_a, type_b) {
                return Some(mapping.clone());
            }
        }
        None
    }

    /// All mappings in registration order
    pub fn all(&self) -> Vec<Arc<dyn RelationshipMapping>> {
        self.index.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::mapping::{BasicRelationshipMapping, ProxyMapping};
    use crate::types::TypeDefCategory;

    fn relationship(guid: &str, name: &str) -> TypeDef {
        TypeDef::new(guid, name, TypeDefCategory::Relationship)
    }

    fn boxed(mapping: BasicRelationshipMapping) -> impl FnOnce() -> Result<Arc<dyn RelationshipMapping>, MappingError> {
        move || Ok(Arc::new(mapping) as Arc<dyn RelationshipMapping>)
    }

    #[test]
    fn test_first_registered_match_wins() {
        let mut store = RelationshipMappingStore::new();
        store.register(
            &relationship("r-1", "SemanticAssignment"),
            boxed(BasicRelationshipMapping::new(
                "SemanticAssignment",
                ProxyMapping::new("*").via("assigned_to_terms"),
                ProxyMapping::new("term"),
            )),
        );
        store.register(
            &relationship("r-2", "ColumnTermAssignment"),
            boxed(BasicRelationshipMapping::new(
                "ColumnTermAssignment",
                ProxyMapping::new("database_column").via("assigned_to_terms"),
                ProxyMapping::new("term"),
            )),
        );

        let found = store
            .lookup_by_endpoint_types("assigned_to_terms", "database_column", "term")
            .unwrap();
        assert_eq!(found.omrs_type_name(), "SemanticAssignment");
    }

    #[test]
    fn test_falls_back_to_sub_mapping() {
        let sub = BasicRelationshipMapping::new(
            "AttributeForSchema",
            ProxyMapping::new("database_table").via("database_columns"),
            ProxyMapping::new("database_column"),
        );
        let parent = BasicRelationshipMapping::new(
            "AttributeForSchema",
            ProxyMapping::new("database_schema").via("database_tables"),
            ProxyMapping::new("database_table"),
        )
        .with_sub_mapping(sub);

        let mut store = RelationshipMappingStore::new();
        assert!(store.register(&relationship("r-afs", "AttributeForSchema"), boxed(parent)));

        let direct = store
            .lookup_by_endpoint_types("database_tables", "database_schema", "database_table")
            .unwrap();
        assert_eq!(direct.proxy_one().external_types, vec!["database_schema".to_string()]);

        let via_sub = store
            .lookup_by_endpoint_types("database_columns", "database_column", "database_table")
            .unwrap();
        assert_eq!(via_sub.proxy_one().external_types, vec!["database_table".to_string()]);
    }

    #[test]
    fn test_invalid_sub_mapping_is_not_stored() {
        let parent = BasicRelationshipMapping::new(
            "AttributeForSchema",
            ProxyMapping::new("database_schema").via("database_tables"),
            ProxyMapping::new("database_table"),
        )
        .with_sub_mapping(BasicRelationshipMapping::new(
            "AttributeForSchema",
            ProxyMapping::new("Database Table"),
            ProxyMapping::new("database_column"),
        ));

        let mut store = RelationshipMappingStore::new();
        assert!(!store.register(&relationship("r-afs", "AttributeForSchema"), boxed(parent)));
        assert!(store.is_empty());
        assert!(store.lookup_by_internal_name("AttributeForSchema").is_none());
    }

    #[test]
    fn test_relationship_level_asset_match() {
        let mut store = RelationshipMappingStore::new();
        store.register(
            &relationship("r-rel", "RelatedTerm"),
            boxed(
                BasicRelationshipMapping::new(
                    "RelatedTerm",
                    ProxyMapping::new("term").via("related_terms"),
                    ProxyMapping::new("term").via("related_terms"),
                )
                .with_relationship_asset("term_relationship"),
            ),
        );

        assert!(store
            .lookup_by_endpoint_types("related_terms", "term_relationship", "term_relationship")
            .is_some());
        assert!(store
            .lookup_by_endpoint_types("related_terms", "term_relationship", "database_table")
            .is_none());
    }

    #[test]
    fn test_miss_returns_none() {
        let store = RelationshipMappingStore::new();
        assert!(store.lookup_by_endpoint_types("anything", "a", "b").is_none());
        assert!(store.lookup_by_internal_name("SemanticAssignment").is_none());
    }

    #[test]
    fn test_proxy_without_types_is_rejected() {
        let mut store = RelationshipMappingStore::new();
        let mapping = BasicRelationshipMapping::new(
            "TermAnchor",
            ProxyMapping::default(),
            ProxyMapping::new("term"),
        );
        assert!(!store.register(&relationship("r-anchor", "TermAnchor"), boxed(mapping)));
        assert!(store.is_empty());
    }
}
