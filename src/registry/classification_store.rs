//! Classification Mapping Store

use crate::error::MappingError;
use crate::registry::index::MappingIndex;
use crate::registry::mapping::{validate_classification_mapping, ClassificationMapping};
use crate::types::TypeDef;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Debug, Default)]
pub struct ClassificationMappingStore {
    index: MappingIndex<dyn ClassificationMapping>,
    /// External asset type -> classification type GUIDs
    by_external_type: HashMap<String, Vec<String>>,
}

impl ClassificationMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, type_def: &TypeDef, factory: F) -> bool
    where
        F: FnOnce() -> Result<Arc<dyn ClassificationMapping>, MappingError>,
    {
        let mapping = match factory()
            .and_then(|m| validate_classification_mapping(type_def, m.as_ref()).map(|_| m))
        {
            Ok(mapping) => mapping,
            Err(e) => {
                error!("Unable to register classification mapping for {}: {}", type_def.name, e);
                return false;
            }
        };

        if !self.index.insert(type_def, mapping.clone()) {
            warn!("Classification mapping for {} ({}) already registered", type_def.name, type_def.guid);
            return false;
        }
        for external in mapping.external_asset_types() {
            let guids = self.by_external_type.entry(external.clone()).or_default();
            if !guids.contains(&type_def.guid) {
                guids.push(type_def.guid.clone());
            }
        }
        debug!("Registered classification mapping {}", type_def.name);
        true
    }

    pub fn lookup_by_internal_id(&self, guid: &str) -> Option<Arc<dyn ClassificationMapping>> {
        self.index.get(guid)
    }

    pub fn lookup_by_internal_name(&self, name: &str) -> Option<Arc<dyn ClassificationMapping>> {
        self.index.get_by_name(name)
    }

    /// Classifications applicable to an external asset type, including those
    /// registered for every asset type
    pub fn lookup_by_external_type(&self, external_type: &str) -> Vec<Arc<dyn ClassificationMapping>> {
        self.index
            .iter()
            .filter(|m| m.applies_to(external_type))
            .cloned()
            .collect()
    }

    /// Classifications registered for exactly this external asset type
    pub fn lookup_by_exact_external_type(&self, external_type: &str) -> Vec<Arc<dyn ClassificationMapping>> {
        self.by_external_type
            .get(external_type)
            .map(|guids| guids.iter().filter_map(|guid| self.index.get(guid)).collect())
            .unwrap_or_default()
    }

    pub fn all(&self) -> Vec<Arc<dyn ClassificationMapping>> {
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
    use crate::registry::mapping::{BasicClassificationMapping, ALL_ASSET_TYPES};
    use crate::types::TypeDefCategory;

    fn classification(guid: &str, name: &str) -> TypeDef {
        TypeDef::new(guid, name, TypeDefCategory::Classification)
    }

    fn boxed(
        mapping: BasicClassificationMapping,
    ) -> impl FnOnce() -> Result<Arc<dyn ClassificationMapping>, MappingError> {
        move || Ok(Arc::new(mapping) as Arc<dyn ClassificationMapping>)
    }

    #[test]
    fn test_lookup_by_external_type_includes_wildcards() {
        let mut store = ClassificationMappingStore::new();
        store.register(
            &classification("c-conf", "Confidentiality"),
            boxed(BasicClassificationMapping::new("Confidentiality").for_type(ALL_ASSET_TYPES)),
        );
        store.register(
            &classification("c-spine", "SpineObject"),
            boxed(
                BasicClassificationMapping::new("SpineObject")
                    .for_type("term")
                    .from_property("assigned_to_terms"),
            ),
        );

        let names: Vec<String> = store
            .lookup_by_external_type("term")
            .iter()
            .map(|m| m.omrs_type_name().to_string())
            .collect();
        assert_eq!(names, vec!["Confidentiality", "SpineObject"]);

        assert_eq!(store.lookup_by_external_type("database_table").len(), 1);
        assert_eq!(store.lookup_by_exact_external_type("term").len(), 1);
    }

    #[test]
    fn test_id_and_name_agree() {
        let mut store = ClassificationMappingStore::new();
        store.register(
            &classification("c-conf", "Confidentiality"),
            boxed(BasicClassificationMapping::new("Confidentiality").for_type("term")),
        );
        let by_id = store.lookup_by_internal_id("c-conf").unwrap();
        let by_name = store.lookup_by_internal_name("Confidentiality").unwrap();
        assert!(Arc::ptr_eq(&by_id, &by_name));
    }
}
