//! Open metadata type definitions
//!
//! The subset of a type definition the registry needs: identity, category,
//! single super-type link and locally declared attributes.

use serde::{Deserialize, Serialize};

/// Category of a type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeDefCategory {
    Entity,
    Relationship,
    Classification,
}

/// Reference to another type definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefLink {
    pub guid: String,
    pub name: String,
}

/// Attribute declared directly on a type definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDef {
    pub name: String,
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl AttributeDef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            description: None,
            required: false,
        }
    }
}

/// A type definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDef {
    pub guid: String,
    pub name: String,
    pub category: TypeDefCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_type: Option<TypeDefLink>,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TypeDef {
    pub fn new(guid: impl Into<String>, name: impl Into<String>, category: TypeDefCategory) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            category,
            super_type: None,
            attributes: Vec::new(),
            description: None,
        }
    }

    pub fn with_super_type(mut self, guid: impl Into<String>, name: impl Into<String>) -> Self {
        self.super_type = Some(TypeDefLink {
            guid: guid.into(),
            name: name.into(),
        });
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.attributes.push(AttributeDef::new(name, type_name));
        self
    }
}

/// The file format of the type definitions loaded at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefGallery {
    pub type_defs: Vec<TypeDef>,
}
