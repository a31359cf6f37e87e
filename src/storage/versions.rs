//! Version store
//!
//! Keeps version records and the current version name, persisted together
//! under [`VERSIONS_KEY`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::persistence::{PersistencePort, VERSIONS_KEY};
use super::{read_bounded, write_bounded, Durability};
use crate::error::{VaultError, VaultResult};
use crate::models::{SnapshotId, Version, VersionId};

/// Serialized form of the version index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct VersionIndex {
    #[serde(default)]
    versions: Vec<Version>,
    #[serde(default)]
    current_version: Option<String>,
}

/// In-memory version index backed by a persistence port
pub struct VersionStore {
    port: Arc<dyn PersistencePort>,
    io_timeout: Duration,
    state: Mutex<VersionIndex>,
}

impl VersionStore {
    pub fn new(port: Arc<dyn PersistencePort>, io_timeout: Duration) -> Self {
        Self {
            port,
            io_timeout,
            state: Mutex::new(VersionIndex::default()),
        }
    }

    /// Replace the in-memory index with the durable copy
    pub async fn load(&self) -> VaultResult<usize> {
        let bytes = read_bounded(self.port.as_ref(), VERSIONS_KEY, self.io_timeout).await?;
        let index: VersionIndex = match bytes {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| VaultError::Storage(format!("Failed to parse version index: {}", e)))?,
            None => VersionIndex::default(),
        };

        let mut state = self.state.lock().await;
        *state = index;
        Ok(state.versions.len())
    }

    /// Add a version; a stable one also becomes current
    pub async fn insert(&self, version: Version) -> Durability {
        let mut state = self.state.lock().await;
        if version.is_stable {
            state.current_version = Some(version.name.clone());
        }
        state.versions.push(version);
        self.persist_locked(&state).await
    }

    /// Look up a version by id
    pub async fn get(&self, id: VersionId) -> VaultResult<Version> {
        let state = self.state.lock().await;
        state
            .versions
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| VaultError::version_not_found(id.to_string()))
    }

    /// All versions, newest first
    pub async fn list(&self) -> Vec<Version> {
        let state = self.state.lock().await;
        let mut versions = state.versions.clone();
        versions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        versions
    }

    /// Flag a version stable and make it current
    pub async fn mark_stable(&self, id: VersionId) -> VaultResult<Durability> {
        let mut state = self.state.lock().await;
        let version = state
            .versions
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| VaultError::version_not_found(id.to_string()))?;
        version.is_stable = true;
        let name = version.name.clone();
        state.current_version = Some(name);
        Ok(self.persist_locked(&state).await)
    }

    /// Set the current version name
    pub async fn set_current(&self, name: &str) -> Durability {
        let mut state = self.state.lock().await;
        state.current_version = Some(name.to_string());
        self.persist_locked(&state).await
    }

    /// Name of the current version, if any has been adopted
    pub async fn current(&self) -> Option<String> {
        self.state.lock().await.current_version.clone()
    }

    /// Snapshots referenced by at least one version
    pub async fn referenced_snapshots(&self) -> HashSet<SnapshotId> {
        let state = self.state.lock().await;
        state.versions.iter().map(|v| v.backup_id).collect()
    }

    async fn persist_locked(&self, state: &VersionIndex) -> Durability {
        match serde_json::to_vec(state) {
            Ok(bytes) => write_bounded(self.port.as_ref(), VERSIONS_KEY, bytes, self.io_timeout).await,
            Err(e) => Durability::Degraded {
                reason: format!("Failed to serialize version index: {}", e),
            },
        }
    }
}
