//! Type Mapping Registry
//!
//! In-memory lookup tables from internal type identifiers to the mapping
//! objects that translate between the external system and open metadata.
//! This module provides:
//! - Type definition store (super-type chains, attribute aggregation)
//! - Entity, relationship and classification mapping stores
//! - An explicit registration table replacing late-bound construction
//!
//! The registry is filled once by [`RegistryBuilder`] and is read-only after
//! [`RegistryBuilder::build`]; share it as `Arc<MappingRegistry>`.

pub mod catalog;
pub mod classification_store;
pub mod entity_store;
pub mod index;
pub mod mapping;
pub mod relationship_store;
pub mod typedef_store;

pub use catalog::RegistrationTable;
pub use classification_store::ClassificationMappingStore;
pub use entity_store::EntityMappingStore;
pub use mapping::{
    BasicClassificationMapping, BasicEntityMapping, BasicRelationshipMapping, ClassificationMapping,
    EntityMapping, ProxyMapping, RelationshipMapping,
};
pub use relationship_store::RelationshipMappingStore;
pub use typedef_store::TypeDefStore;

use crate::error::RegistryError;
use crate::types::{TypeDefCategory, TypeDefGallery};
use std::path::Path;
use tracing::{debug, info, warn};

/// "Is type X a subtype of Y" capability
pub trait TypeHierarchy {
    /// True when `actual` equals `expected` or has it as an ancestor
    fn is_type_of(&self, actual: &str, expected: &str) -> bool;
}

/// Read a type definition gallery from a JSON file
pub fn load_gallery(path: impl AsRef<Path>) -> Result<TypeDefGallery, RegistryError> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let gallery: TypeDefGallery = serde_json::from_str(&raw)?;
    info!(
        "Loaded {} type definitions from {}",
        gallery.type_defs.len(),
        path.as_ref().display()
    );
    Ok(gallery)
}

/// Counts collected while populating the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulationReport {
    pub type_defs: usize,
    pub mapped: usize,
    pub unmapped: usize,
    pub failed: usize,
}

/// Mutable phase of the registry
pub struct RegistryBuilder {
    type_defs: TypeDefStore,
    entities: EntityMappingStore,
    relationships: RelationshipMappingStore,
    classifications: ClassificationMappingStore,
    report: PopulationReport,
}

impl RegistryBuilder {
    pub fn new(max_supertype_depth: usize) -> Self {
        Self {
            type_defs: TypeDefStore::new(max_supertype_depth),
            entities: EntityMappingStore::new(),
            relationships: RelationshipMappingStore::new(),
            classifications: ClassificationMappingStore::new(),
            report: PopulationReport::default(),
        }
    }

    /// Add every type definition, then register a mapping for each one the
    /// table knows. Unmapped types are recorded; failed factories are skipped.
    pub fn populate(mut self, gallery: TypeDefGallery, table: &RegistrationTable) -> Result<Self, RegistryError> {
        let type_defs = gallery.type_defs;
        for type_def in &type_defs {
            self.type_defs.add(type_def.clone())?;
        }
        self.report.type_defs += type_defs.len();

        for type_def in &type_defs {
            let registered = match type_def.category {
                TypeDefCategory::Entity => table
                    .entity_factory(&type_def.name)
                    .map(|factory| self.entities.register(type_def, factory)),
                TypeDefCategory::Relationship => table
                    .relationship_factory(&type_def.name)
                    .map(|factory| self.relationships.register(type_def, factory)),
                TypeDefCategory::Classification => table
                    .classification_factory(&type_def.name)
                    .map(|factory| self.classifications.register(type_def, factory)),
            };

            match registered {
                Some(true) => self.report.mapped += 1,
                Some(false) => {
                    self.report.failed += 1;
                    self.type_defs.mark_unimplemented(&type_def.name);
                }
                None => {
                    debug!("No mapping registered for type {}", type_def.name);
                    self.report.unmapped += 1;
                    self.type_defs.mark_unimplemented(&type_def.name);
                }
            }
        }
        Ok(self)
    }

    /// Direct access for connectors that register mappings by hand
    pub fn type_defs_mut(&mut self) -> &mut TypeDefStore {
        &mut self.type_defs
    }

    pub fn entities_mut(&mut self) -> &mut EntityMappingStore {
        &mut self.entities
    }

    pub fn relationships_mut(&mut self) -> &mut RelationshipMappingStore {
        &mut self.relationships
    }

    pub fn classifications_mut(&mut self) -> &mut ClassificationMappingStore {
        &mut self.classifications
    }

    /// Freeze the registry. Fails on a malformed type hierarchy.
    pub fn build(self) -> Result<MappingRegistry, RegistryError> {
        self.type_defs.validate_hierarchy()?;

        for type_def in self.type_defs.all() {
            let Some(mapping) = self.entities.lookup_by_internal_id(&type_def.guid) else {
                continue;
            };
            let attributes = self.type_defs.all_attributes_for(&type_def.guid)?;
            for property in mapping.property_mappings() {
                if !attributes.contains_key(&property.omrs_attribute) {
                    warn!(
                        "Mapping for {} targets attribute {} which the type does not define",
                        type_def.name, property.omrs_attribute
                    );
                }
            }
        }

        info!(
            "Mapping registry ready: {} types, {} entity / {} relationship / {} classification mappings, {} unmapped, {} failed",
            self.report.type_defs,
            self.entities.len(),
            self.relationships.len(),
            self.classifications.len(),
            self.report.unmapped,
            self.report.failed
        );

        Ok(MappingRegistry {
            type_defs: self.type_defs,
            entities: self.entities,
            relationships: self.relationships,
            classifications: self.classifications,
            report: self.report,
        })
    }
}

/// Read-only mapping registry
#[derive(Debug)]
pub struct MappingRegistry {
    type_defs: TypeDefStore,
    entities: EntityMappingStore,
    relationships: RelationshipMappingStore,
    classifications: ClassificationMappingStore,
    report: PopulationReport,
}

impl MappingRegistry {
    pub fn type_defs(&self) -> &TypeDefStore {
        &self.type_defs
    }

    pub fn entities(&self) -> &EntityMappingStore {
        &self.entities
    }

    pub fn relationships(&self) -> &RelationshipMappingStore {
        &self.relationships
    }

    pub fn classifications(&self) -> &ClassificationMappingStore {
        &self.classifications
    }

    pub fn report(&self) -> PopulationReport {
        self.report
    }
}

impl TypeHierarchy for MappingRegistry {
    fn is_type_of(&self, actual: &str, expected: &str) -> bool {
        self.type_defs.is_type_of(actual, expected)
    }
}
