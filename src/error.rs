//! Custom error types for SnapVault
//!
//! This module defines the error hierarchy for the snapshot core using
//! thiserror for ergonomic error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for SnapVault operations
#[derive(Error, Debug)]
pub enum VaultError {
    /// A state provider could not produce its payload slot
    #[error("Collection failed for provider '{provider}': {reason}")]
    CollectionFailed { provider: String, reason: String },

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Durable write failed while the in-memory state stayed consistent
    #[error("Persistence degraded: {0}")]
    PersistenceDegraded(String),

    /// One or more providers refused their slot during a restore
    #[error("Restore rejected by {}; pre-restore checkpoint {checkpoint} holds the prior state", .rejected.join(", "))]
    RestoreRejected {
        rejected: Vec<String>,
        checkpoint: String,
    },

    /// Invalid auto-save interval or retention count
    #[error("Scheduler misconfigured: {0}")]
    SchedulerMisconfigured(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Failure classes reported through the observability port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CollectionFailed,
    NotFound,
    PersistenceDegraded,
    RestoreRejected,
    SchedulerMisconfigured,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::CollectionFailed => write!(f, "CollectionFailed"),
            ErrorKind::NotFound => write!(f, "NotFound"),
            ErrorKind::PersistenceDegraded => write!(f, "PersistenceDegraded"),
            ErrorKind::RestoreRejected => write!(f, "RestoreRejected"),
            ErrorKind::SchedulerMisconfigured => write!(f, "SchedulerMisconfigured"),
        }
    }
}

impl VaultError {
    /// Create a "not found" error for snapshots
    pub fn snapshot_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Snapshot",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for versions
    pub fn version_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Version",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Map this error onto the observable failure taxonomy, if it belongs to it
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::CollectionFailed { .. } => Some(ErrorKind::CollectionFailed),
            Self::NotFound { .. } => Some(ErrorKind::NotFound),
            Self::PersistenceDegraded(_) => Some(ErrorKind::PersistenceDegraded),
            Self::RestoreRejected { .. } => Some(ErrorKind::RestoreRejected),
            Self::SchedulerMisconfigured(_) => Some(ErrorKind::SchedulerMisconfigured),
            _ => None,
        }
    }
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for SnapVault operations
pub type VaultResult<T> = Result<T, VaultError>;
