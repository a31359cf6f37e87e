//! Storage layer for SnapVault
//!
//! In-memory indexes of snapshots and versions backed by a durable
//! key-value [`PersistencePort`]. Every mutation persists the whole index
//! before returning; when the medium refuses, the mutation still holds in
//! memory and the caller receives [`Durability::Degraded`].

pub mod file_io;
pub mod persistence;
pub mod snapshots;
pub mod versions;

use std::time::Duration;

pub use file_io::{read_json, write_json_atomic};
pub use persistence::{FilePersistence, MemoryPersistence, PersistencePort, BACKUPS_KEY, VERSIONS_KEY};
pub use snapshots::{SnapshotStore, StoreReceipt};
pub use versions::VersionStore;

use crate::error::VaultError;

/// Whether a mutation reached the durable medium
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Durability {
    /// In-memory and durable copies match
    Durable,
    /// Held in memory only; the next mutation retries the write
    Degraded { reason: String },
}

impl Durability {
    pub fn is_durable(&self) -> bool {
        matches!(self, Durability::Durable)
    }

    /// Why the write failed, if it did
    pub fn reason(&self) -> Option<&str> {
        match self {
            Durability::Durable => None,
            Durability::Degraded { reason } => Some(reason),
        }
    }

    /// The soft failure as an error value, for callers that want one
    pub fn as_error(&self) -> Option<VaultError> {
        self.reason()
            .map(|reason| VaultError::PersistenceDegraded(reason.to_string()))
    }

    /// Keep the first degradation of two sequential writes
    pub fn and(self, other: Durability) -> Durability {
        match self {
            Durability::Durable => other,
            degraded => degraded,
        }
    }
}

/// Write `bytes` under `key`, bounded by `timeout`
pub(crate) async fn write_bounded(
    port: &dyn PersistencePort,
    key: &str,
    bytes: Vec<u8>,
    timeout: Duration,
) -> Durability {
    match tokio::time::timeout(timeout, port.write(key, bytes)).await {
        Ok(Ok(())) => Durability::Durable,
        Ok(Err(e)) => Durability::Degraded {
            reason: e.to_string(),
        },
        Err(_) => Durability::Degraded {
            reason: format!("write of '{}' timed out after {:?}", key, timeout),
        },
    }
}

/// Read `key`, bounded by `timeout`
pub(crate) async fn read_bounded(
    port: &dyn PersistencePort,
    key: &str,
    timeout: Duration,
) -> Result<Option<Vec<u8>>, VaultError> {
    tokio::time::timeout(timeout, port.read(key))
        .await
        .map_err(|_| VaultError::Storage(format!("read of '{}' timed out after {:?}", key, timeout)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durability_and_keeps_first_degradation() {
        let first = Durability::Degraded {
            reason: "quota".into(),
        };
        let second = Durability::Degraded {
            reason: "offline".into(),
        };

        assert_eq!(Durability::Durable.and(Durability::Durable), Durability::Durable);
        assert_eq!(first.clone().and(second.clone()).reason(), Some("quota"));
        assert_eq!(Durability::Durable.and(second).reason(), Some("offline"));
        assert!(matches!(
            first.as_error(),
            Some(VaultError::PersistenceDegraded(_))
        ));
        assert!(Durability::Durable.as_error().is_none());
    }
}
