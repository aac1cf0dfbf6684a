//! Error handling module
//!
//! Provides the error types shared across the registry, the governance
//! listener and the relay binary. Ordinary lookup misses are never errors;
//! these types only cover configuration faults and transport failures.

use thiserror::Error;

/// A factory could not produce a usable mapping for a type definition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Invalid mapping for {type_name}: {reason}")]
    Invalid { type_name: String, reason: String },

    #[error("Failed to construct mapping for {type_name}: {reason}")]
    Construction { type_name: String, reason: String },
}

impl MappingError {
    pub fn invalid(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        MappingError::Invalid {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub fn construction(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        MappingError::Construction {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

/// Fatal registry configuration errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Super-type cycle detected at type {type_name}")]
    SupertypeCycle { type_name: String },

    #[error("Super-type chain of {type_name} exceeds depth limit {limit}")]
    SupertypeDepthExceeded { type_name: String, limit: usize },

    #[error("Duplicate type definition: {0}")]
    DuplicateType(String),

    #[error("Failed to read type definitions: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed type definitions: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outbound transport failures
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Out topic channel is closed")]
    ChannelClosed,

    #[error("Out topic channel is full (capacity {0})")]
    ChannelFull(usize),

    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl PublishError {
    /// Short stable name used in audit details
    pub fn kind(&self) -> &'static str {
        match self {
            PublishError::ChannelClosed => "ChannelClosed",
            PublishError::ChannelFull(_) => "ChannelFull",
            PublishError::Serialization(_) => "Serialization",
            PublishError::Transport(_) => "Transport",
        }
    }
}

/// Top-level error for startup and the relay binary
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
