//! OMRS Relay - type mapping registry and governance event relay
//!
//! Two pieces that sit between an open metadata repository and its
//! consumers:
//! - [`registry`]: lookup tables from internal type definitions to the
//!   mappings that translate an external system's assets
//! - [`governance`]: classifies repository change events and republishes the
//!   ones a governance server cares about

pub mod config;
pub mod error;
pub mod governance;
pub mod omrs;
pub mod registry;
pub mod state;
pub mod types;
