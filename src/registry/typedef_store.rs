//! Type Definition Store
//!
//! Holds every type definition known to the connector, whether or not a
//! mapping exists for it, and answers questions about the super-type chain.

use crate::error::RegistryError;
use crate::registry::TypeHierarchy;
use crate::types::{AttributeDef, TypeDef};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::warn;

pub const DEFAULT_MAX_SUPERTYPE_DEPTH: usize = 32;

#[derive(Debug)]
pub struct TypeDefStore {
    by_guid: HashMap<String, TypeDef>,
    name_to_guid: HashMap<String, String>,
    order: Vec<String>,
    /// Types with no mapping in this connector
    unimplemented: BTreeSet<String>,
    max_depth: usize,
}

impl TypeDefStore {
    pub fn new(max_depth: usize) -> Self {
        Self {
            by_guid: HashMap::new(),
            name_to_guid: HashMap::new(),
            order: Vec::new(),
            unimplemented: BTreeSet::new(),
            max_depth,
        }
    }

    pub fn add(&mut self, type_def: TypeDef) -> Result<(), RegistryError> {
        if self.by_guid.contains_key(&type_def.guid) || self.name_to_guid.contains_key(&type_def.name) {
            return Err(RegistryError::DuplicateType(type_def.name));
        }
        self.name_to_guid.insert(type_def.name.clone(), type_def.guid.clone());
        self.order.push(type_def.guid.clone());
        self.by_guid.insert(type_def.guid.clone(), type_def);
        Ok(())
    }

    pub fn by_guid(&self, guid: &str) -> Option<&TypeDef> {
        self.by_guid.get(guid)
    }

    pub fn by_name(&self, name: &str) -> Option<&TypeDef> {
        self.name_to_guid.get(name).and_then(|guid| self.by_guid.get(guid))
    }

    /// All type definitions in the order they were added
    pub fn all(&self) -> impl Iterator<Item = &TypeDef> {
        self.order.iter().filter_map(|guid| self.by_guid.get(guid))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn mark_unimplemented(&mut self, name: impl Into<String>) {
        self.unimplemented.insert(name.into());
    }

    pub fn unimplemented(&self) -> impl Iterator<Item = &str> {
        self.unimplemented.iter().map(String::as_str)
    }

    pub fn is_implemented(&self, name: &str) -> bool {
        self.name_to_guid.contains_key(name) && !self.unimplemented.contains(name)
    }

    fn parent_of(&self, type_def: &TypeDef) -> Option<&TypeDef> {
        let link = type_def.super_type.as_ref()?;
        self.by_guid(&link.guid).or_else(|| self.by_name(&link.name))
    }

    /// Walk from a type up its super-type chain, calling `visit` on each type
    /// (the type itself first). Fails on a cycle or an over-deep chain.
    fn walk_chain<'a>(
        &'a self,
        start: &'a TypeDef,
        mut visit: impl FnMut(&'a TypeDef),
    ) -> Result<(), RegistryError> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = Some(start);
        let mut hops = 0usize;

        while let Some(type_def) = current {
            if !visited.insert(type_def.guid.as_str()) {
                return Err(RegistryError::SupertypeCycle {
                    type_name: type_def.name.clone(),
                });
            }
            if hops > self.max_depth {
                return Err(RegistryError::SupertypeDepthExceeded {
                    type_name: start.name.clone(),
                    limit: self.max_depth,
                });
            }
            visit(type_def);
            current = self.parent_of(type_def);
            hops += 1;
        }
        Ok(())
    }

    /// Every attribute of a type, including inherited ones. A subtype's
    /// attribute shadows an ancestor's attribute of the same name. Unknown
    /// types yield an empty map.
    pub fn all_attributes_for(&self, guid: &str) -> Result<BTreeMap<String, AttributeDef>, RegistryError> {
        let mut merged = BTreeMap::new();
        let Some(start) = self.by_guid(guid) else {
            warn!("No type definition with GUID {}", guid);
            return Ok(merged);
        };

        self.walk_chain(start, |type_def| {
            for attribute in &type_def.attributes {
                merged
                    .entry(attribute.name.clone())
                    .or_insert_with(|| attribute.clone());
            }
        })?;
        Ok(merged)
    }

    /// Names of every ancestor of a type, nearest first
    pub fn super_type_names(&self, name: &str) -> Result<Vec<String>, RegistryError> {
        let mut names = Vec::new();
        if let Some(start) = self.by_name(name) {
            self.walk_chain(start, |type_def| names.push(type_def.name.clone()))?;
            names.remove(0);
        }
        Ok(names)
    }

    /// Check every chain terminates within the depth limit. A super-type
    /// that is not loaded ends its chain early and is only reported.
    pub fn validate_hierarchy(&self) -> Result<(), RegistryError> {
        for type_def in self.all() {
            if let Some(link) = &type_def.super_type {
                if self.parent_of(type_def).is_none() {
                    warn!("Super-type {} of {} is not a known type", link.name, type_def.name);
                }
            }
            self.walk_chain(type_def, |_| {})?;
        }
        Ok(())
    }
}

impl Default for TypeDefStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SUPERTYPE_DEPTH)
    }
}

impl TypeHierarchy for TypeDefStore {
    fn is_type_of(&self, actual: &str, expected: &str) -> bool {
        if actual == expected {
            return true;
        }
        match self.super_type_names(actual) {
            Ok(ancestors) => ancestors.iter().any(|name| name == expected),
            Err(e) => {
                warn!("Cannot resolve super-types of {}: {}", actual, e);
                false
            }
        }
    }
}
