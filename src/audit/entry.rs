//! Failure event data structures
//!
//! Defines the structured event emitted for every failure class the core
//! handles, plus the operation that was running when it happened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, VaultError};

/// Core operations that can report a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateBackup,
    AutoBackup,
    RestoreBackup,
    DeleteBackup,
    ImportBackup,
    CreateVersion,
    RestoreVersion,
    MarkStable,
    Configure,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::CreateBackup => write!(f, "CREATE_BACKUP"),
            Operation::AutoBackup => write!(f, "AUTO_BACKUP"),
            Operation::RestoreBackup => write!(f, "RESTORE_BACKUP"),
            Operation::DeleteBackup => write!(f, "DELETE_BACKUP"),
            Operation::ImportBackup => write!(f, "IMPORT_BACKUP"),
            Operation::CreateVersion => write!(f, "CREATE_VERSION"),
            Operation::RestoreVersion => write!(f, "RESTORE_VERSION"),
            Operation::MarkStable => write!(f, "MARK_STABLE"),
            Operation::Configure => write!(f, "CONFIGURE"),
        }
    }
}

/// A single structured failure event
///
/// Carries no user-facing text; collaborators decide how to present it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEvent {
    /// When the failure was observed (UTC)
    pub timestamp: DateTime<Utc>,

    /// Operation that was running
    pub operation: Operation,

    /// Failure class
    pub error_kind: ErrorKind,

    /// Free-form detail (ids involved, rejecting providers, medium error)
    pub context: serde_json::Value,
}

impl FailureEvent {
    /// Create an event stamped now
    pub fn new(operation: Operation, error_kind: ErrorKind, context: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            error_kind,
            context,
        }
    }

    /// Build an event from an error, if it belongs to the observable taxonomy
    pub fn from_error(operation: Operation, error: &VaultError) -> Option<Self> {
        let kind = error.kind()?;
        let context = match error {
            VaultError::CollectionFailed { provider, reason } => {
                serde_json::json!({ "provider": provider, "reason": reason })
            }
            VaultError::NotFound {
                entity_type,
                identifier,
            } => serde_json::json!({ "entity_type": entity_type, "identifier": identifier }),
            VaultError::RestoreRejected {
                rejected,
                checkpoint,
            } => serde_json::json!({ "rejected": rejected, "checkpoint": checkpoint }),
            other => serde_json::json!({ "message": other.to_string() }),
        };
        Some(Self::new(operation, kind, context))
    }

    /// Format the event for human-readable output
    pub fn format_human_readable(&self) -> String {
        format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.error_kind,
            self.context
        )
    }
}
