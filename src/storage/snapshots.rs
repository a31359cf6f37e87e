//! Snapshot store
//!
//! Owns every retained snapshot. Reads are served from memory; each
//! mutation rewrites the whole index under [`BACKUPS_KEY`] while holding the
//! store lock, so a prune can never interleave with an insert.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::persistence::{PersistencePort, BACKUPS_KEY};
use super::{read_bounded, write_bounded, Durability};
use crate::backup::retention::RetentionPolicy;
use crate::error::{VaultError, VaultResult};
use crate::models::{Snapshot, SnapshotId};

/// Serialized form of the snapshot index
#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotIndex {
    #[serde(default)]
    snapshots: Vec<Snapshot>,
}

#[derive(Serialize)]
struct SnapshotIndexRef<'a> {
    snapshots: Vec<&'a Snapshot>,
}

#[derive(Debug, Default)]
struct StoreState {
    snapshots: HashMap<SnapshotId, Snapshot>,
    last_sequence: u64,
    degraded: bool,
}

/// Result of an insert that also applied retention
#[derive(Debug, Clone)]
pub struct StoreReceipt {
    pub durability: Durability,
    /// Snapshots discarded by the retention pass
    pub pruned: Vec<SnapshotId>,
}

/// In-memory snapshot index backed by a persistence port
pub struct SnapshotStore {
    port: Arc<dyn PersistencePort>,
    io_timeout: Duration,
    state: Mutex<StoreState>,
}

impl SnapshotStore {
    /// Create an empty store; call [`SnapshotStore::load`] once at start
    pub fn new(port: Arc<dyn PersistencePort>, io_timeout: Duration) -> Self {
        Self {
            port,
            io_timeout,
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Replace the in-memory index with the durable copy
    ///
    /// An absent key is an empty store. An unreadable or corrupt medium is
    /// an error: starting empty would overwrite it on the next mutation.
    pub async fn load(&self) -> VaultResult<usize> {
        let bytes = read_bounded(self.port.as_ref(), BACKUPS_KEY, self.io_timeout).await?;
        let index: SnapshotIndex = match bytes {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| VaultError::Storage(format!("Failed to parse snapshot index: {}", e)))?,
            None => SnapshotIndex::default(),
        };

        let mut state = self.state.lock().await;
        state.snapshots.clear();
        state.last_sequence = 0;
        for snapshot in index.snapshots {
            state.last_sequence = state.last_sequence.max(snapshot.sequence());
            state.snapshots.insert(snapshot.id(), snapshot);
        }

        tracing::debug!(count = state.snapshots.len(), "snapshot index loaded");
        Ok(state.snapshots.len())
    }

    /// Insert a snapshot (last write wins on an existing id)
    pub async fn put(&self, snapshot: Snapshot) -> Durability {
        let mut state = self.state.lock().await;
        Self::insert_locked(&mut state, snapshot);
        self.persist_locked(&mut state).await
    }

    /// Insert a snapshot, then prune with `policy` in the same critical section
    ///
    /// Ids in `pinned` are never pruned here. The inserted snapshot goes
    /// through the policy like any other, so with no room left for
    /// automatic snapshots a new auto one is discarded straight away.
    pub async fn insert_with_retention(
        &self,
        snapshot: Snapshot,
        policy: &RetentionPolicy,
        pinned: &HashSet<SnapshotId>,
    ) -> StoreReceipt {
        let mut state = self.state.lock().await;
        Self::insert_locked(&mut state, snapshot);

        let plan = policy.plan(state.snapshots.values(), pinned);
        for id in &plan.discard {
            state.snapshots.remove(id);
        }
        if !plan.discard.is_empty() {
            tracing::debug!(pruned = plan.discard.len(), "retention pass discarded snapshots");
        }

        let durability = self.persist_locked(&mut state).await;
        StoreReceipt {
            durability,
            pruned: plan.discard,
        }
    }

    /// Look up a snapshot by id
    pub async fn get(&self, id: SnapshotId) -> VaultResult<Snapshot> {
        let state = self.state.lock().await;
        state
            .snapshots
            .get(&id)
            .cloned()
            .ok_or_else(|| VaultError::snapshot_not_found(id.to_string()))
    }

    /// Check whether a snapshot is retained
    pub async fn contains(&self, id: SnapshotId) -> bool {
        self.state.lock().await.snapshots.contains_key(&id)
    }

    /// All snapshots, newest first
    pub async fn list(&self) -> Vec<Snapshot> {
        let state = self.state.lock().await;
        let mut snapshots: Vec<Snapshot> = state.snapshots.values().cloned().collect();
        snapshots.sort_by(Snapshot::newest_first);
        snapshots
    }

    /// Number of retained snapshots
    pub async fn len(&self) -> usize {
        self.state.lock().await.snapshots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Delete a snapshot; deleting an unknown id is a no-op
    pub async fn delete(&self, id: SnapshotId) -> Durability {
        let mut state = self.state.lock().await;
        if state.snapshots.remove(&id).is_none() && !state.degraded {
            return Durability::Durable;
        }
        self.persist_locked(&mut state).await
    }

    /// Delete every snapshot
    pub async fn clear(&self) -> Durability {
        let mut state = self.state.lock().await;
        state.snapshots.clear();
        self.persist_locked(&mut state).await
    }

    /// Whether the last write failed and the store runs memory-only
    pub async fn is_degraded(&self) -> bool {
        self.state.lock().await.degraded
    }

    fn insert_locked(state: &mut StoreState, mut snapshot: Snapshot) {
        state.last_sequence += 1;
        snapshot.assign_sequence(state.last_sequence);
        state.snapshots.insert(snapshot.id(), snapshot);
    }

    async fn persist_locked(&self, state: &mut StoreState) -> Durability {
        let mut snapshots: Vec<&Snapshot> = state.snapshots.values().collect();
        snapshots.sort_by_key(|s| s.sequence());

        let durability = match serde_json::to_vec(&SnapshotIndexRef { snapshots }) {
            Ok(bytes) => write_bounded(self.port.as_ref(), BACKUPS_KEY, bytes, self.io_timeout).await,
            Err(e) => Durability::Degraded {
                reason: format!("Failed to serialize snapshot index: {}", e),
            },
        };

        match (&durability, state.degraded) {
            (Durability::Degraded { reason }, false) => {
                tracing::warn!(%reason, "snapshot store running memory-only");
                state.degraded = true;
            }
            (Durability::Durable, true) => {
                tracing::info!("snapshot store persistence recovered");
                state.degraded = false;
            }
            _ => {}
        }
        durability
    }
}
