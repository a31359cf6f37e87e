//! Core data models for SnapVault
//!
//! Snapshots (full point-in-time copies of every tracked collection) and the
//! versions that tag them.

pub mod ids;
pub mod snapshot;
pub mod version;

pub use ids::{SnapshotId, VersionId};
pub use snapshot::{Payload, Snapshot, SnapshotKind};
pub use version::Version;
