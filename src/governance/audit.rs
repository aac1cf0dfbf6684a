//! Audit log
//!
//! Append-only record of what the governance listener observed and any
//! failures it absorbed. Every entry is mirrored to `tracing`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCode {
    RegistryLoaded,
    ListenerStarted,
    ListenerStopped,
    InterestingEvent,
    OutTopicFailure,
}

impl AuditCode {
    pub fn message_id(self) -> &'static str {
        match self {
            AuditCode::RegistryLoaded => "GOVERNANCE-SERVER-0001",
            AuditCode::ListenerStarted => "GOVERNANCE-SERVER-0002",
            AuditCode::ListenerStopped => "GOVERNANCE-SERVER-0003",
            AuditCode::InterestingEvent => "GOVERNANCE-SERVER-0010",
            AuditCode::OutTopicFailure => "GOVERNANCE-SERVER-0020",
        }
    }

    pub fn severity(self) -> AuditSeverity {
        match self {
            AuditCode::OutTopicFailure => AuditSeverity::Error,
            _ => AuditSeverity::Info,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub code: AuditCode,
    pub message_id: String,
    pub severity: AuditSeverity,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// In-memory audit log
pub struct AuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Record an entry
    pub async fn log(&self, code: AuditCode, message: impl Into<String>, details: Option<serde_json::Value>) {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            code,
            message_id: code.message_id().to_string(),
            severity: code.severity(),
            message: message.into(),
            details,
        };

        match entry.severity {
            AuditSeverity::Info => info!(message_id = %entry.message_id, "{}", entry.message),
            AuditSeverity::Warning => warn!(message_id = %entry.message_id, "{}", entry.message),
            AuditSeverity::Error => error!(message_id = %entry.message_id, "{}", entry.message),
        }

        let mut log = self.entries.write().await;
        log.push(entry);
    }

    /// Entries, most recent first, optionally filtered by code
    pub async fn entries(&self, code: Option<AuditCode>, limit: usize) -> Vec<AuditEntry> {
        let log = self.entries.read().await;

        log.iter()
            .rev()
            .filter(|e| code.map(|c| e.code == c).unwrap_or(true))
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn count(&self, code: AuditCode) -> usize {
        let log = self.entries.read().await;
        log.iter().filter(|e| e.code == code).count()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
