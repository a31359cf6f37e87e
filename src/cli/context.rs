//! Composition root for the command line
//!
//! Wires the file-backed providers, the snapshot and version stores, the
//! audit log and both managers from one base directory.

use std::sync::Arc;

use crate::audit::{AuditLogger, Observer};
use crate::backup::BackupManager;
use crate::config::{Settings, VaultPaths};
use crate::error::VaultResult;
use crate::providers::{JsonFileProvider, PayloadCollector};
use crate::storage::{FilePersistence, SnapshotStore, VersionStore};
use crate::versions::VersionManager;

/// Tracked collections, in restore order
///
/// Homeworks reference students and subjects, so those are restored first;
/// settings go last.
pub const COLLECTIONS: [&str; 4] = ["students", "subjects", "homeworks", "settings"];

/// Everything a command needs
pub struct VaultContext {
    pub paths: VaultPaths,
    pub settings: Settings,
    pub backups: Arc<BackupManager>,
    pub versions: VersionManager,
    pub audit: Arc<AuditLogger>,
}

impl VaultContext {
    /// Open (creating if needed) the vault under `paths`
    pub async fn open(paths: VaultPaths) -> VaultResult<Self> {
        paths.ensure_directories()?;
        let settings = Settings::load_or_create(&paths)?;

        let mut collector = PayloadCollector::new();
        for name in COLLECTIONS {
            collector.register(Arc::new(JsonFileProvider::new(
                name,
                paths.collection_file(name),
            )))?;
        }

        let port = Arc::new(FilePersistence::new(paths.store_dir()));
        let audit = Arc::new(AuditLogger::new(paths.audit_log()));
        let observer: Arc<dyn Observer> = audit.clone();

        let store = Arc::new(SnapshotStore::new(port.clone(), settings.persistence_timeout()));
        let loaded = store.load().await?;
        let backups = BackupManager::new(collector, store, observer.clone(), &settings)?;

        let versions = VersionManager::new(
            backups.clone(),
            VersionStore::new(port, settings.persistence_timeout()),
            observer,
            settings.protect_versioned_snapshots,
        );
        versions.load().await?;

        tracing::debug!(base_dir = %paths.base_dir().display(), snapshots = loaded, "vault opened");
        Ok(Self {
            paths,
            settings,
            backups,
            versions,
            audit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_layout() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        let ctx = VaultContext::open(paths.clone()).await.unwrap();

        assert!(paths.data_dir().exists());
        assert!(paths.store_dir().exists());
        assert_eq!(ctx.backups.provider_names(), COLLECTIONS.to_vec());
    }

    #[tokio::test]
    async fn test_reopen_sees_snapshots() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::create_dir_all(paths.data_dir()).unwrap();
        std::fs::write(paths.collection_file("students"), r#"[{"name":"Ada"}]"#).unwrap();

        let ctx = VaultContext::open(paths.clone()).await.unwrap();
        let receipt = ctx
            .backups
            .create_backup(None, vec![], crate::models::SnapshotKind::Manual)
            .await
            .unwrap();
        assert!(receipt.durability.is_durable());
        drop(ctx);

        let reopened = VaultContext::open(paths).await.unwrap();
        let snapshot = reopened.backups.get_backup(receipt.id).await.unwrap();
        assert_eq!(
            snapshot.payload().slot("students"),
            Some(&serde_json::json!([{"name": "Ada"}]))
        );
    }
}
