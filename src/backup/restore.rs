//! Restore and validation results
//!
//! Types describing what a restore did, where a restore currently stands,
//! and whether a snapshot covers every registered collection.

use chrono::{DateTime, Utc};

use crate::models::SnapshotId;
use crate::storage::Durability;

/// Where the single in-flight restore stands
///
/// `Idle → CheckpointInProgress → (CheckpointFailed | CheckpointOk) →
/// Restoring → (RestoreFailed | RestoreOk) → Idle`. There is no automatic
/// transition back to the pre-restore checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestorePhase {
    #[default]
    Idle,
    CheckpointInProgress,
    CheckpointFailed,
    CheckpointOk,
    Restoring,
    RestoreFailed,
    RestoreOk,
}

impl std::fmt::Display for RestorePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RestorePhase::Idle => "idle",
            RestorePhase::CheckpointInProgress => "checkpoint-in-progress",
            RestorePhase::CheckpointFailed => "checkpoint-failed",
            RestorePhase::CheckpointOk => "checkpoint-ok",
            RestorePhase::Restoring => "restoring",
            RestorePhase::RestoreFailed => "restore-failed",
            RestorePhase::RestoreOk => "restore-ok",
        };
        write!(f, "{}", name)
    }
}

/// Result of a successful restore
#[derive(Debug, Clone)]
pub struct RestoreReport {
    /// Snapshot that was restored
    pub target: SnapshotId,
    /// When the restored snapshot was captured
    pub captured_at: DateTime<Utc>,
    /// Checkpoint holding the state that was overwritten
    pub checkpoint: SnapshotId,
    /// Providers that accepted their slot, in restore order
    pub accepted: Vec<String>,
    /// Providers with no slot in the snapshot, left untouched
    pub missing: Vec<String>,
    /// Whether the checkpoint (and any follow-up write) reached the medium
    pub durability: Durability,
}

impl RestoreReport {
    /// Get a summary of what was restored
    pub fn summary(&self) -> String {
        let mut summary = format!("Restored: {}", self.accepted.join(", "));
        if !self.missing.is_empty() {
            summary.push_str(&format!(" (not in backup: {})", self.missing.join(", ")));
        }
        summary
    }
}

/// Result of validating a snapshot against the registered providers
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Schema version recorded in the snapshot
    pub schema_version: String,
    /// Whether it matches the schema version new snapshots are written with
    pub schema_matches: bool,
    /// When the snapshot was captured
    pub captured_at: DateTime<Utc>,
    /// Registered collections present in the snapshot
    pub present: Vec<String>,
    /// Registered collections absent from the snapshot
    pub missing: Vec<String>,
    /// Slots in the snapshot no registered provider claims
    pub unknown: Vec<String>,
}

impl ValidationResult {
    /// Check if every registered collection is present
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Get a summary of what data is present
    pub fn summary(&self) -> String {
        if self.is_complete() {
            format!("Complete backup (v{})", self.schema_version)
        } else {
            format!(
                "Partial backup (v{}): has {}, missing {}",
                self.schema_version,
                if self.present.is_empty() {
                    "nothing".to_string()
                } else {
                    self.present.join(", ")
                },
                self.missing.join(", ")
            )
        }
    }
}
