//! Version model
//!
//! A version is a named tag pointing at one checkpoint snapshot.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{SnapshotId, VersionId};

/// A named, optionally stable, reference to a checkpoint snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: VersionId,
    /// Human-readable label; uniqueness is a convention, not enforced
    pub name: String,
    pub backup_id: SnapshotId,
    #[serde(default)]
    pub changes: Vec<String>,
    #[serde(default)]
    pub is_stable: bool,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Version {
    /// Create a new version record for an existing snapshot
    pub fn new(
        name: impl Into<String>,
        backup_id: SnapshotId,
        changes: Vec<String>,
        tags: BTreeSet<String>,
        is_stable: bool,
    ) -> Self {
        Self {
            id: VersionId::new(),
            name: name.into(),
            backup_id,
            changes,
            is_stable,
            tags,
            created_at: Utc::now(),
        }
    }
}
