//! GUID and name index shared by every mapping store

use crate::types::TypeDef;
use std::collections::HashMap;
use std::sync::Arc;

/// Mappings keyed by type GUID, with a name -> GUID side index and the
/// order in which types were registered.
#[derive(Debug)]
pub struct MappingIndex<M: ?Sized> {
    by_guid: HashMap<String, Arc<M>>,
    name_to_guid: HashMap<String, String>,
    order: Vec<String>,
}

impl<M: ?Sized> MappingIndex<M> {
    pub fn new() -> Self {
        Self {
            by_guid: HashMap::new(),
            name_to_guid: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Insert under both keys, or under neither if either is taken
    pub fn insert(&mut self, type_def: &TypeDef, mapping: Arc<M>) -> bool {
        if self.by_guid.contains_key(&type_def.guid) || self.name_to_guid.contains_key(&type_def.name) {
            return false;
        }
        self.by_guid.insert(type_def.guid.clone(), mapping);
        self.name_to_guid.insert(type_def.name.clone(), type_def.guid.clone());
        self.order.push(type_def.guid.clone());
        true
    }

    pub fn get(&self, guid: &str) -> Option<Arc<M>> {
        self.by_guid.get(guid).cloned()
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<M>> {
        self.name_to_guid.get(name).and_then(|guid| self.get(guid))
    }

    pub fn guid_for_name(&self, name: &str) -> Option<&str> {
        self.name_to_guid.get(name).map(String::as_str)
    }

    /// Mappings in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<M>> {
        self.order.iter().filter_map(|guid| self.by_guid.get(guid))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<M: ?Sized> Default for MappingIndex<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDefCategory;

    #[test]
    fn test_duplicate_name_leaves_index_untouched() {
        let mut index: MappingIndex<str> = MappingIndex::new();
        let first = TypeDef::new("g-1", "GlossaryTerm", TypeDefCategory::Entity);
        let clash = TypeDef::new("g-2", "GlossaryTerm", TypeDefCategory::Entity);

        assert!(index.insert(&first, Arc::from("first")));
        assert!(!index.insert(&clash, Arc::from("second")));

        assert_eq!(index.len(), 1);
        assert!(index.get("g-2").is_none());
        assert_eq!(index.get_by_name("GlossaryTerm").as_deref(), Some("first"));
        assert_eq!(index.guid_for_name("GlossaryTerm"), Some("g-1"));
    }

    #[test]
    fn test_iter_follows_registration_order() {
        let mut index: MappingIndex<str> = MappingIndex::new();
        for (guid, name) in [("z", "Zeta"), ("a", "Alpha"), ("m", "Mu")] {
            index.insert(&TypeDef::new(guid, name, TypeDefCategory::Entity), Arc::from(name));
        }
        let names: Vec<&str> = index.iter().map(|m| m.as_ref()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mu"]);
    }
}
