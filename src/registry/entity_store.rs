//! Entity Mapping Store
//!
//! Resolves entity mappings by internal type GUID or name, by external asset
//! type, by external asset type plus prefix, and by external display name.

use crate::error::MappingError;
use crate::registry::index::MappingIndex;
use crate::registry::mapping::{validate_entity_mapping, EntityMapping};
use crate::types::TypeDef;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Store for entity mappings
#[derive(Debug, Default)]
pub struct EntityMappingStore {
    index: MappingIndex<dyn EntityMapping>,
    /// External asset type -> type GUIDs, in registration order
    by_external_type: HashMap<String, Vec<String>>,
    /// (External asset type, prefix) -> type GUID
    by_external_type_and_prefix: HashMap<(String, Option<String>), String>,
    /// External display name -> type GUID
    by_display_name: HashMap<String, String>,
}

impl EntityMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping with `factory` and store it under every applicable key.
    /// Returns false (and stores nothing) when the factory fails, the mapping
    /// is invalid, or the type is already registered.
    pub fn register<F>(&mut self, type_def: &TypeDef, factory: F) -> bool
    where
        F: FnOnce() -> Result<Arc<dyn EntityMapping>, MappingError>,
    {
        let mapping = match factory().and_then(|m| validate_entity_mapping(type_def, m.as_ref()).map(|_| m)) {
            Ok(mapping) => mapping,
            Err(e) => {
                error!("Unable to register entity mapping for {}: {}", type_def.name, e);
                return false;
            }
        };

        let prefix_key = (
            mapping.external_asset_type().to_string(),
            mapping.rid_prefix().map(str::to_string),
        );
        if let Some(existing) = self.by_external_type_and_prefix.get(&prefix_key) {
            warn!(
                "External type {} with prefix {:?} already maps to {}; skipping {}",
                prefix_key.0, prefix_key.1, existing, type_def.name
            );
            return false;
        }

        if !self.index.insert(type_def, mapping.clone()) {
            warn!("Entity mapping for {} ({}) already registered", type_def.name, type_def.guid);
            return false;
        }

        for external in mapping.all_external_types() {
            let guids = self.by_external_type.entry(external.to_string()).or_default();
            if !guids.contains(&type_def.guid) {
                guids.push(type_def.guid.clone());
            }
        }
        self.by_external_type_and_prefix.insert(prefix_key, type_def.guid.clone());
        self.by_display_name
            .entry(mapping.external_display_name().to_string())
            .or_insert_with(|| type_def.guid.clone());

        debug!(
            "Registered entity mapping {} <- {} (prefix {:?})",
            type_def.name,
            mapping.external_asset_type(),
            mapping.rid_prefix()
        );
        true
    }

    pub fn lookup_by_internal_id(&self, guid: &str) -> Option<Arc<dyn EntityMapping>> {
        self.index.get(guid)
    }

    pub fn lookup_by_internal_name(&self, name: &str) -> Option<Arc<dyn EntityMapping>> {
        self.index.get_by_name(name)
    }

    /// All mappings for an external asset type; the caller disambiguates
    pub fn lookup_by_external_type(&self, external_type: &str) -> Vec<Arc<dyn EntityMapping>> {
        self.by_external_type
            .get(external_type)
            .map(|guids| guids.iter().filter_map(|guid| self.index.get(guid)).collect())
            .unwrap_or_default()
    }

    /// Exact match on the external asset type and prefix
    pub fn lookup_by_external_type_and_prefix(
        &self,
        external_type: &str,
        prefix: Option<&str>,
    ) -> Option<Arc<dyn EntityMapping>> {
        let key = (external_type.to_string(), prefix.map(str::to_string));
        self.by_external_type_and_prefix
            .get(&key)
            .and_then(|guid| self.index.get(guid))
    }

    pub fn lookup_by_display_name(&self, display_name: &str) -> Option<Arc<dyn EntityMapping>> {
        self.by_display_name
            .get(display_name)
            .and_then(|guid| self.index.get(guid))
    }

    pub fn guid_for_name(&self, name: &str) -> Option<&str> {
        self.index.guid_for_name(name)
    }

    /// All mappings in registration order
    pub fn all(&self) -> Vec<Arc<dyn EntityMapping>> {
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
    use crate::registry::mapping::BasicEntityMapping;
    use crate::types::TypeDefCategory;

    fn entity(guid: &str, name: &str) -> TypeDef {
        TypeDef::new(guid, name, TypeDefCategory::Entity)
    }

    fn factory(mapping: BasicEntityMapping) -> impl FnOnce() -> Result<Arc<dyn EntityMapping>, MappingError> {
        move || Ok(Arc::new(mapping) as Arc<dyn EntityMapping>)
    }

    fn glossary_store() -> EntityMappingStore {
        let mut store = EntityMappingStore::new();
        assert!(store.register(
            &entity("g-glossary", "Glossary"),
            factory(BasicEntityMapping::new("Glossary", "category").with_prefix("glossary_")),
        ));
        assert!(store.register(
            &entity("g-category", "GlossaryCategory"),
            factory(BasicEntityMapping::new("GlossaryCategory", "category")),
        ));
        assert!(store.register(
            &entity("g-term", "GlossaryTerm"),
            factory(BasicEntityMapping::new("GlossaryTerm", "term")),
        ));
        store
    }

    #[test]
    fn test_id_and_name_lookups_agree() {
        let store = glossary_store();
        for (guid, name) in [("g-glossary", "Glossary"), ("g-category", "GlossaryCategory"), ("g-term", "GlossaryTerm")] {
            let by_id = store.lookup_by_internal_id(guid).unwrap();
            let by_name = store.lookup_by_internal_name(name).unwrap();
            assert!(Arc::ptr_eq(&by_id, &by_name));
        }
    }

    #[test]
    fn test_external_type_returns_every_candidate_once() {
        let store = glossary_store();
        let candidates = store.lookup_by_external_type("category");

        let names: Vec<&str> = candidates.iter().map(|m| m.omrs_type_name()).collect();
        assert_eq!(names, vec!["Glossary", "GlossaryCategory"]);
        assert!(store.lookup_by_external_type("database_table").is_empty());
    }

    #[test]
    fn test_prefix_disambiguates_shared_external_type() {
        let store = glossary_store();

        let glossary = store.lookup_by_external_type_and_prefix("category", Some("glossary_")).unwrap();
        assert_eq!(glossary.omrs_type_name(), "Glossary");

        let category = store.lookup_by_external_type_and_prefix("category", None).unwrap();
        assert_eq!(category.omrs_type_name(), "GlossaryCategory");

        assert!(store.lookup_by_external_type_and_prefix("category", Some("other_")).is_none());
    }

    #[test]
    fn test_display_name_lookup() {
        let store = glossary_store();
        assert_eq!(store.lookup_by_display_name("Term").unwrap().omrs_type_name(), "GlossaryTerm");
        // first registered wins on a shared display name
        assert_eq!(store.lookup_by_display_name("Category").unwrap().omrs_type_name(), "Glossary");
    }

    #[test]
    fn test_failed_factory_registers_nothing() {
        let mut store = EntityMappingStore::new();
        let registered = store.register(&entity("g-term", "GlossaryTerm"), || {
            Err(MappingError::construction("GlossaryTerm", "no connector support"))
        });

        assert!(!registered);
        assert!(store.is_empty());
        assert!(store.lookup_by_internal_name("GlossaryTerm").is_none());
        assert!(store.lookup_by_external_type("term").is_empty());
    }

    #[test]
    fn test_invalid_mapping_registers_nothing() {
        let mut store = EntityMappingStore::new();
        let registered = store.register(
            &entity("g-term", "GlossaryTerm"),
            factory(BasicEntityMapping::new("GlossaryCategory", "term")),
        );

        assert!(!registered);
        assert!(store.lookup_by_internal_id("g-term").is_none());
        assert!(store.lookup_by_external_type("term").is_empty());
        assert!(store.lookup_by_display_name("Term").is_none());
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let mut store = glossary_store();
        let again = store.register(
            &entity("g-term", "GlossaryTerm"),
            factory(BasicEntityMapping::new("GlossaryTerm", "term").with_prefix("dup_")),
        );

        assert!(!again);
        assert_eq!(store.len(), 3);
        assert_eq!(store.lookup_by_external_type("term").len(), 1);
        assert!(store.lookup_by_external_type_and_prefix("term", Some("dup_")).is_none());
    }

    #[test]
    fn test_other_external_types_are_indexed() {
        let mut store = EntityMappingStore::new();
        store.register(
            &entity("g-file", "DataFile"),
            factory(BasicEntityMapping::new("DataFile", "data_file").with_other_type("data_file_folder")),
        );
        assert_eq!(store.lookup_by_external_type("data_file_folder").len(), 1);
    }
}
