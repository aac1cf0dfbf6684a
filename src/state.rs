//! Application state management
//!
//! Shared, read-only-after-startup state handed to the relay tasks.

use crate::config::Settings;
use crate::governance::AuditLog;
use crate::registry::MappingRegistry;
use std::sync::Arc;

/// State shared by the listener, publisher and reporting code
pub struct RelayState {
    pub settings: Settings,

    /// Frozen mapping registry; also answers type hierarchy queries
    pub registry: Arc<MappingRegistry>,

    /// Audit log written by the listener and publisher
    pub audit: Arc<AuditLog>,
}

impl RelayState {
    pub fn new(settings: Settings, registry: MappingRegistry) -> Self {
        Self {
            settings,
            registry: Arc::new(registry),
            audit: Arc::new(AuditLog::new()),
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<RelayState>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RegistrationTable, RegistryBuilder, TypeHierarchy};
    use crate::types::{TypeDef, TypeDefCategory, TypeDefGallery};

    #[test]
    fn test_state_shares_registry() {
        let registry = RegistryBuilder::new(4)
            .populate(
                TypeDefGallery {
                    type_defs: vec![
                        TypeDef::new("t-cap", "SoftwareCapability", TypeDefCategory::Entity),
                        TypeDef::new("t-engine", "GovernanceEngine", TypeDefCategory::Entity)
                            .with_super_type("t-cap", "SoftwareCapability"),
                    ],
                },
                &RegistrationTable::new(),
            )
            .unwrap()
            .build()
            .unwrap();

        let state: SharedState = Arc::new(RelayState::new(Settings::default(), registry));
        let hierarchy = state.registry.clone();

        assert!(hierarchy.is_type_of("GovernanceEngine", "SoftwareCapability"));
        assert_eq!(Arc::strong_count(&state.registry), 2);
        assert!(tokio_test::block_on(state.audit.is_empty()));
    }
}
