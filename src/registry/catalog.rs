//! Registration table
//!
//! Maps internal type names to constructor closures, one table per type
//! category. The registry consults it while populating; a type with no entry
//! is simply left unimplemented.

use crate::error::MappingError;
use crate::registry::mapping::{
    BasicClassificationMapping, BasicEntityMapping, BasicRelationshipMapping, ClassificationMapping,
    EntityMapping, ProxyMapping, RelationshipMapping, ALL_ASSET_TYPES,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type EntityFactory = Box<dyn Fn() -> Result<Arc<dyn EntityMapping>, MappingError> + Send + Sync>;
pub type RelationshipFactory =
    Box<dyn Fn() -> Result<Arc<dyn RelationshipMapping>, MappingError> + Send + Sync>;
pub type ClassificationFactory =
    Box<dyn Fn() -> Result<Arc<dyn ClassificationMapping>, MappingError> + Send + Sync>;

#[derive(Default)]
pub struct RegistrationTable {
    entities: HashMap<String, EntityFactory>,
    relationships: HashMap<String, RelationshipFactory>,
    classifications: HashMap<String, ClassificationFactory>,
}

impl fmt::Debug for RegistrationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationTable")
            .field("entities", &self.entities.len())
            .field("relationships", &self.relationships.len())
            .field("classifications", &self.classifications.len())
            .finish()
    }
}

impl RegistrationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity<F>(&mut self, type_name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Arc<dyn EntityMapping>, MappingError> + Send + Sync + 'static,
    {
        self.entities.insert(type_name.into(), Box::new(factory));
        self
    }

    pub fn relationship<F>(&mut self, type_name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Arc<dyn RelationshipMapping>, MappingError> + Send + Sync + 'static,
    {
        self.relationships.insert(type_name.into(), Box::new(factory));
        self
    }

    pub fn classification<F>(&mut self, type_name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Arc<dyn ClassificationMapping>, MappingError> + Send + Sync + 'static,
    {
        self.classifications.insert(type_name.into(), Box::new(factory));
        self
    }

    /// Register a data-driven entity mapping under its own type name
    pub fn entity_mapping(&mut self, mapping: BasicEntityMapping) -> &mut Self {
        let name = mapping.omrs_type_name().to_string();
        self.entity(name, move || Ok(Arc::new(mapping.clone()) as Arc<dyn EntityMapping>))
    }

    pub fn relationship_mapping(&mut self, mapping: BasicRelationshipMapping) -> &mut Self {
        let name = mapping.omrs_type_name().to_string();
        self.relationship(name, move || {
            Ok(Arc::new(mapping.clone()) as Arc<dyn RelationshipMapping>)
        })
    }

    pub fn classification_mapping(&mut self, mapping: BasicClassificationMapping) -> &mut Self {
        let name = mapping.omrs_type_name().to_string();
        self.classification(name, move || {
            Ok(Arc::new(mapping.clone()) as Arc<dyn ClassificationMapping>)
        })
    }

    pub fn entity_factory(&self, type_name: &str) -> Option<&EntityFactory> {
        self.entities.get(type_name)
    }

    pub fn relationship_factory(&self, type_name: &str) -> Option<&RelationshipFactory> {
        self.relationships.get(type_name)
    }

    pub fn classification_factory(&self, type_name: &str) -> Option<&ClassificationFactory> {
        self.classifications.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.entities.len() + self.relationships.len() + self.classifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Built-in mappings for glossary and relational database assets
    pub fn with_defaults() -> Self {
        let mut table = Self::new();

        table
            .entity_mapping(
                BasicEntityMapping::new("Glossary", "category")
                    .with_prefix("glossary_")
                    .with_property("name", "displayName")
                    .with_property("long_description", "description"),
            )
            .entity_mapping(
                BasicEntityMapping::new("GlossaryCategory", "category")
                    .with_property("name", "displayName")
                    .with_property("short_description", "description"),
            )
            .entity_mapping(
                BasicEntityMapping::new("GlossaryTerm", "term")
                    .with_property("name", "displayName")
                    .with_property("short_description", "summary")
                    .with_property("long_description", "description")
                    .with_property("example", "examples")
                    .with_property("abbreviation", "abbreviation")
                    .with_property("usage", "usage"),
            )
            .entity_mapping(
                BasicEntityMapping::new("Database", "database")
                    .with_property("name", "name")
                    .with_property("short_description", "description")
                    .with_property("dbms", "databaseType")
                    .with_property("dbms_version", "databaseVersion"),
            )
            .entity_mapping(
                BasicEntityMapping::new("DeployedDatabaseSchema", "database_schema")
                    .with_property("name", "name")
                    .with_property("short_description", "description"),
            )
            .entity_mapping(
                BasicEntityMapping::new("RelationalDBSchemaType", "database_schema")
                    .with_prefix("schema_type_")
                    .with_display_name("Database Schema Type")
                    .with_property("name", "displayName"),
            )
            .entity_mapping(
                BasicEntityMapping::new("RelationalTable", "database_table")
                    .with_other_type("view")
                    .with_property("name", "displayName")
                    .with_property("short_description", "description"),
            )
            .entity_mapping(
                BasicEntityMapping::new("RelationalColumn", "database_column")
                    .with_property("name", "displayName")
                    .with_property("short_description", "description")
                    .with_property("position", "position"),
            );

        table
            .relationship_mapping(BasicRelationshipMapping::new(
                "TermAnchor",
                ProxyMapping::new("category"),
                ProxyMapping::new("term").via("parent_category"),
            ))
            .relationship_mapping(BasicRelationshipMapping::new(
                "CategoryAnchor",
                ProxyMapping::new("category").via("subcategories"),
                ProxyMapping::new("category").via("parent_category"),
            ))
            .relationship_mapping(BasicRelationshipMapping::new(
                "TermCategorization",
                ProxyMapping::new("category").via("terms"),
                ProxyMapping::new("term").via("referencing_categories"),
            ))
            .relationship_mapping(BasicRelationshipMapping::new(
                "SemanticAssignment",
                ProxyMapping::new(ALL_ASSET_TYPES).via("assigned_to_terms"),
                ProxyMapping::new("term").via("assigned_assets"),
            ))
            .relationship_mapping(
                BasicRelationshipMapping::new(
                    "AttributeForSchema",
                    ProxyMapping::new("database_schema").via("database_tables"),
                    ProxyMapping::new("database_table").with_type("view"),
                )
                .with_sub_mapping(BasicRelationshipMapping::new(
                    "AttributeForSchema",
                    ProxyMapping::new("database_table").with_type("view").via("database_columns"),
                    ProxyMapping::new("database_column"),
                )),
            );

        table
            .classification_mapping(
                BasicClassificationMapping::new("Confidentiality")
                    .for_type(ALL_ASSET_TYPES)
                    .from_property("assigned_to_terms"),
            )
            .classification_mapping(
                BasicClassificationMapping::new("SpineObject")
                    .for_type("term")
                    .from_property("is_spine_object")
                    .when_value("true"),
            );

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_category() {
        let table = RegistrationTable::with_defaults();
        assert_eq!(table.len(), 15);
        assert!(table.entity_factory("GlossaryTerm").is_some());
        assert!(table.relationship_factory("SemanticAssignment").is_some());
        assert!(table.classification_factory("Confidentiality").is_some());
        assert!(table.entity_factory("GovernanceEngine").is_none());
    }

    #[test]
    fn test_factory_builds_fresh_mapping() {
        let table = RegistrationTable::with_defaults();
        let factory = table.entity_factory("Glossary").unwrap();

        let mapping = factory().unwrap();
        assert_eq!(mapping.external_asset_type(), "category");
        assert_eq!(mapping.rid_prefix(), Some("glossary_"));
    }
}
