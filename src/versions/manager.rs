//! Version manager

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::audit::{FailureEvent, Observer, Operation};
use crate::backup::{BackupManager, RestoreReport};
use crate::error::{ErrorKind, VaultError, VaultResult};
use crate::models::{SnapshotId, SnapshotKind, Version, VersionId};
use crate::storage::{Durability, VersionStore};

/// Tag placed on every snapshot taken for a version
pub const VERSION_TAG: &str = "version";

/// Result of creating a version
#[derive(Debug, Clone)]
pub struct VersionReceipt {
    pub id: VersionId,
    pub backup_id: SnapshotId,
    /// Combined durability of the checkpoint and the version record
    pub durability: Durability,
}

/// Names checkpoints as versions and tracks the current version
pub struct VersionManager {
    backups: Arc<BackupManager>,
    store: VersionStore,
    observer: Arc<dyn Observer>,
    protect_versioned: bool,
}

impl VersionManager {
    pub fn new(
        backups: Arc<BackupManager>,
        store: VersionStore,
        observer: Arc<dyn Observer>,
        protect_versioned: bool,
    ) -> Self {
        Self {
            backups,
            store,
            observer,
            protect_versioned,
        }
    }

    /// Load the durable version index
    ///
    /// With snapshot protection on, every referenced snapshot is pinned
    /// against retention.
    pub async fn load(&self) -> VaultResult<usize> {
        let count = self.store.load().await?;
        if self.protect_versioned {
            for id in self.store.referenced_snapshots().await {
                self.backups.pin(id);
            }
        }
        Ok(count)
    }

    /// Take a checkpoint and record it as version `name`
    pub async fn create_version(
        &self,
        name: &str,
        changes: Vec<String>,
        tags: Vec<String>,
        is_stable: bool,
    ) -> VaultResult<VersionReceipt> {
        let name = name.trim();
        if name.is_empty() {
            return Err(VaultError::Validation("Version name cannot be empty".into()));
        }

        let mut snapshot_tags = tags.clone();
        snapshot_tags.push(VERSION_TAG.to_string());
        let checkpoint = self
            .backups
            .create_backup(
                Some(format!("Version {}", name)),
                snapshot_tags,
                SnapshotKind::Checkpoint,
            )
            .await?;

        if self.protect_versioned {
            self.backups.pin(checkpoint.id);
        }

        let version = Version::new(
            name,
            checkpoint.id,
            changes,
            tags.into_iter().collect::<BTreeSet<_>>(),
            is_stable,
        );
        let id = version.id;
        let durability = checkpoint.durability.and(self.store.insert(version).await);
        self.report_durability(Operation::CreateVersion, &durability);

        tracing::info!(%id, name, stable = is_stable, backup_id = %checkpoint.id, "version created");
        Ok(VersionReceipt {
            id,
            backup_id: checkpoint.id,
            durability,
        })
    }

    /// Restore the snapshot behind a version and adopt it as current
    pub async fn restore_version(&self, id: VersionId) -> VaultResult<RestoreReport> {
        let version = match self.store.get(id).await {
            Ok(version) => version,
            Err(e) => {
                self.report_error(Operation::RestoreVersion, &e);
                return Err(e);
            }
        };

        let mut report = self.backups.restore_backup(version.backup_id).await?;
        let durability = self.store.set_current(&version.name).await;
        self.report_durability(Operation::RestoreVersion, &durability);
        report.durability = report.durability.and(durability);

        tracing::info!(%id, name = %version.name, "version restored");
        Ok(report)
    }

    /// Flag a version stable and make it current; takes no new snapshot
    pub async fn mark_as_stable(&self, id: VersionId) -> VaultResult<Durability> {
        let durability = match self.store.mark_stable(id).await {
            Ok(durability) => durability,
            Err(e) => {
                self.report_error(Operation::MarkStable, &e);
                return Err(e);
            }
        };
        self.report_durability(Operation::MarkStable, &durability);
        Ok(durability)
    }

    /// Name of the current version, if one has been adopted
    pub async fn get_current_version(&self) -> Option<String> {
        self.store.current().await
    }

    /// Stable versions, newest first
    pub async fn get_stable_versions(&self) -> Vec<Version> {
        self.store
            .list()
            .await
            .into_iter()
            .filter(|v| v.is_stable)
            .collect()
    }

    /// All versions, newest first
    pub async fn get_versions(&self) -> Vec<Version> {
        self.store.list().await
    }

    pub async fn get_version(&self, id: VersionId) -> VaultResult<Version> {
        self.store.get(id).await
    }

    /// Resolve a full id, an unambiguous short form (`ver-1a2b3c4d`) or a
    /// version name (newest wins when names repeat)
    pub async fn resolve_id(&self, query: &str) -> VaultResult<VersionId> {
        if let Ok(id) = query.parse::<VersionId>() {
            return Ok(id);
        }

        let versions = self.store.list().await;
        if let Some(version) = versions.iter().find(|v| v.name == query) {
            return Ok(version.id);
        }

        let prefix = query.strip_prefix("ver-").unwrap_or(query).to_lowercase();
        let matches: Vec<VersionId> = versions
            .iter()
            .map(|v| v.id)
            .filter(|id| !prefix.is_empty() && id.as_uuid().to_string().starts_with(&prefix))
            .collect();

        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(VaultError::version_not_found(query)),
            _ => Err(VaultError::Validation(format!(
                "'{}' matches {} versions; use a longer id",
                query,
                matches.len()
            ))),
        }
    }

    fn report_error(&self, operation: Operation, error: &VaultError) {
        if let Some(event) = FailureEvent::from_error(operation, error) {
            self.observer.report(&event);
        }
    }

    fn report_durability(&self, operation: Operation, durability: &Durability) {
        if let Some(reason) = durability.reason() {
            self.observer.report(&FailureEvent::new(
                operation,
                ErrorKind::PersistenceDegraded,
                serde_json::json!({ "reason": reason }),
            ));
        }
    }
}
