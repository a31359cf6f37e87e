//! Snapshot model
//!
//! A snapshot is a full, self-contained copy of every tracked collection at
//! one instant. Identity, timestamp, kind, description and tags are fixed at
//! capture; only the store assigns the insertion sequence.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::SnapshotId;

/// How a snapshot came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    /// Taken by the auto-save scheduler; the only kind retention may prune
    Auto,
    /// Requested explicitly by the user
    Manual,
    /// Safety net taken by the core itself (pre-restore, versions, errors)
    Checkpoint,
}

impl SnapshotKind {
    /// Whether retention keeps this kind unconditionally
    pub fn is_protected(&self) -> bool {
        !matches!(self, SnapshotKind::Auto)
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotKind::Auto => write!(f, "auto"),
            SnapshotKind::Manual => write!(f, "manual"),
            SnapshotKind::Checkpoint => write!(f, "checkpoint"),
        }
    }
}

impl std::str::FromStr for SnapshotKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(SnapshotKind::Auto),
            "manual" => Ok(SnapshotKind::Manual),
            "checkpoint" => Ok(SnapshotKind::Checkpoint),
            other => Err(format!("unknown snapshot kind: {}", other)),
        }
    }
}

/// Opaque composite of every tracked collection, one slot per provider
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, serde_json::Value>);

impl Payload {
    /// Create an empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slot for one collection
    pub fn insert(&mut self, slot: impl Into<String>, value: serde_json::Value) {
        self.0.insert(slot.into(), value);
    }

    /// Get the slot captured for one collection
    pub fn slot(&self, slot: &str) -> Option<&serde_json::Value> {
        self.0.get(slot)
    }

    /// Names of all captured slots, sorted
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of captured slots
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no slot was captured
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialized size in bytes
    pub fn size_bytes(&self) -> usize {
        serde_json::to_vec(&self.0).map(|v| v.len()).unwrap_or(0)
    }
}

impl FromIterator<(String, serde_json::Value)> for Payload {
    fn from_iter<I: IntoIterator<Item = (String, serde_json::Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A retained point-in-time capture (a "backup" in the UI)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    id: SnapshotId,
    #[serde(default)]
    sequence: u64,
    timestamp: DateTime<Utc>,
    schema_version: String,
    kind: SnapshotKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    tags: BTreeSet<String>,
    payload: Payload,
}

impl Snapshot {
    /// Capture a new snapshot of `payload` taken now
    pub(crate) fn capture(
        kind: SnapshotKind,
        schema_version: impl Into<String>,
        payload: Payload,
    ) -> Self {
        Self {
            id: SnapshotId::new(),
            sequence: 0,
            timestamp: Utc::now(),
            schema_version: schema_version.into(),
            kind,
            description: None,
            tags: BTreeSet::new(),
            payload,
        }
    }

    pub(crate) fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub(crate) fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    #[cfg(test)]
    pub(crate) fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Store-assigned insertion order
    pub(crate) fn assign_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    /// Turn an exported snapshot into a fresh manual one with a new identity
    pub(crate) fn reissue_as_import(mut self) -> Self {
        self.id = SnapshotId::new();
        self.sequence = 0;
        self.kind = SnapshotKind::Manual;
        self.tags.insert("imported".to_string());
        self
    }

    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn kind(&self) -> SnapshotKind {
        self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Ordering used everywhere snapshots are listed: newest first, later
    /// insertions first on equal timestamps
    pub fn newest_first(a: &Snapshot, b: &Snapshot) -> std::cmp::Ordering {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.sequence.cmp(&a.sequence))
            .then_with(|| a.id.cmp(&b.id))
    }
}
