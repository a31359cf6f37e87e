//! Backup manager for SnapVault
//!
//! Orchestrates capture (manual, automatic, checkpoint), applies the
//! retention policy, restores snapshots behind a mandatory pre-restore
//! checkpoint, and owns the auto-save scheduler.

use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::restore::{RestorePhase, RestoreReport, ValidationResult};
use super::retention::RetentionPolicy;
use super::scheduler::AutoSaveScheduler;
use crate::audit::{FailureEvent, Observer, Operation};
use crate::config::Settings;
use crate::error::{ErrorKind, VaultError, VaultResult};
use crate::models::{Payload, Snapshot, SnapshotId, SnapshotKind};
use crate::providers::PayloadCollector;
use crate::storage::{Durability, SnapshotStore};

/// Tag placed on every pre-restore checkpoint
pub const PRE_RESTORE_TAG: &str = "pre-restore";

/// Tag placed on checkpoints taken after a handled application error
pub const ERROR_RECOVERY_TAG: &str = "error-recovery";

/// Result of a successful capture
#[derive(Debug, Clone)]
pub struct BackupReceipt {
    pub id: SnapshotId,
    pub durability: Durability,
    /// Automatic snapshots discarded by the retention pass
    pub pruned: Vec<SnapshotId>,
}

/// What an auto-save tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoBackupOutcome {
    Created(SnapshotId),
    /// A restore was in flight; capturing now would record a half-restored state
    Skipped,
    /// Reported to the observer; never propagated
    Failed,
    /// Collection outran the tick timeout; nothing was stored
    TimedOut,
}

/// Counts and bounds of the retained snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupStats {
    pub total: usize,
    pub auto: usize,
    pub manual: usize,
    pub checkpoint: usize,
    pub newest: Option<DateTime<Utc>>,
    pub oldest: Option<DateTime<Utc>>,
    pub payload_bytes: usize,
}

#[derive(Debug, Clone)]
struct ManagerConfig {
    retention: RetentionPolicy,
    auto_save_interval: Duration,
    tick_timeout: Duration,
    schema_version: String,
}

/// Creates, retains and restores snapshots
pub struct BackupManager {
    collector: PayloadCollector,
    store: Arc<SnapshotStore>,
    observer: Arc<dyn Observer>,
    config: RwLock<ManagerConfig>,
    pinned: RwLock<HashSet<SnapshotId>>,
    restore_lock: tokio::sync::Mutex<()>,
    phase: Mutex<RestorePhase>,
    scheduler: AutoSaveScheduler,
}

impl BackupManager {
    /// Create a new BackupManager over an already loaded store
    pub fn new(
        collector: PayloadCollector,
        store: Arc<SnapshotStore>,
        observer: Arc<dyn Observer>,
        settings: &Settings,
    ) -> VaultResult<Arc<Self>> {
        settings.validate()?;
        Ok(Arc::new(Self {
            collector,
            store,
            observer,
            config: RwLock::new(ManagerConfig {
                retention: RetentionPolicy::new(settings.max_auto_backups),
                auto_save_interval: settings.auto_save_interval(),
                tick_timeout: settings.tick_timeout(),
                schema_version: settings.payload_schema_version.clone(),
            }),
            pinned: RwLock::new(HashSet::new()),
            restore_lock: tokio::sync::Mutex::new(()),
            phase: Mutex::new(RestorePhase::Idle),
            scheduler: AutoSaveScheduler::new(),
        }))
    }

    /// Capture the current state as a new snapshot of `kind`
    ///
    /// On `CollectionFailed` the store is left unchanged.
    pub async fn create_backup(
        &self,
        description: Option<String>,
        tags: Vec<String>,
        kind: SnapshotKind,
    ) -> VaultResult<BackupReceipt> {
        let operation = match kind {
            SnapshotKind::Auto => Operation::AutoBackup,
            _ => Operation::CreateBackup,
        };
        self.capture(kind, description, tags, None, operation).await
    }

    /// Capture an automatic snapshot; failures are observed, never returned
    pub async fn create_auto_backup(&self) -> AutoBackupOutcome {
        let Ok(_restoring) = self.restore_lock.try_lock() else {
            tracing::debug!("restore in progress; auto-save tick skipped");
            return AutoBackupOutcome::Skipped;
        };

        match self
            .capture(SnapshotKind::Auto, None, Vec::new(), None, Operation::AutoBackup)
            .await
        {
            Ok(receipt) => AutoBackupOutcome::Created(receipt.id),
            // Already reported by capture
            Err(_) => AutoBackupOutcome::Failed,
        }
    }

    /// Checkpoint taken when the host handles an application error
    pub async fn create_safety_checkpoint(&self, reason: &str) -> VaultResult<BackupReceipt> {
        self.capture(
            SnapshotKind::Checkpoint,
            Some(format!("Safety checkpoint: {}", reason)),
            vec![ERROR_RECOVERY_TAG.to_string()],
            None,
            Operation::CreateBackup,
        )
        .await
    }

    /// Restore a snapshot
    ///
    /// The current state is checkpointed first; if that fails nothing is
    /// restored. Slots are applied in provider registration order. A
    /// provider refusing its slot yields `RestoreRejected`; the providers
    /// that accepted keep the restored state and the checkpoint holds the
    /// prior one.
    pub async fn restore_backup(&self, id: SnapshotId) -> VaultResult<RestoreReport> {
        let _restoring = self.restore_lock.lock().await;

        let target = match self.store.get(id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.report_error(Operation::RestoreBackup, &e);
                return Err(e);
            }
        };

        self.set_phase(RestorePhase::CheckpointInProgress);
        let checkpoint = match self
            .capture(
                SnapshotKind::Checkpoint,
                Some(format!("Before restoring {}", id)),
                vec![PRE_RESTORE_TAG.to_string()],
                Some(id),
                Operation::RestoreBackup,
            )
            .await
        {
            Ok(receipt) => {
                self.set_phase(RestorePhase::CheckpointOk);
                receipt
            }
            Err(e) => {
                self.set_phase(RestorePhase::CheckpointFailed);
                self.set_phase(RestorePhase::Idle);
                tracing::error!(target_id = %id, error = %e, "pre-restore checkpoint failed; restore aborted");
                return Err(e);
            }
        };

        self.set_phase(RestorePhase::Restoring);
        let outcome = self.collector.apply(target.payload());

        if !outcome.all_accepted() {
            self.set_phase(RestorePhase::RestoreFailed);
            self.set_phase(RestorePhase::Idle);
            let err = VaultError::RestoreRejected {
                rejected: outcome.rejected,
                checkpoint: checkpoint.id.as_uuid().to_string(),
            };
            self.report_error(Operation::RestoreBackup, &err);
            return Err(err);
        }

        self.set_phase(RestorePhase::RestoreOk);
        self.set_phase(RestorePhase::Idle);
        tracing::info!(target_id = %id, checkpoint = %checkpoint.id, "snapshot restored");

        Ok(RestoreReport {
            target: id,
            captured_at: target.timestamp(),
            checkpoint: checkpoint.id,
            accepted: outcome.accepted,
            missing: outcome.missing,
            durability: checkpoint.durability,
        })
    }

    /// All retained snapshots, newest first
    pub async fn get_backups(&self) -> Vec<Snapshot> {
        self.store.list().await
    }

    /// Look up one snapshot
    pub async fn get_backup(&self, id: SnapshotId) -> VaultResult<Snapshot> {
        self.store.get(id).await
    }

    /// Resolve a full id or an unambiguous short form (`snap-1a2b3c4d`)
    pub async fn resolve_id(&self, query: &str) -> VaultResult<SnapshotId> {
        if let Ok(id) = query.parse::<SnapshotId>() {
            return Ok(id);
        }
        let prefix = query.strip_prefix("snap-").unwrap_or(query).to_lowercase();
        let matches: Vec<SnapshotId> = self
            .store
            .list()
            .await
            .into_iter()
            .map(|s| s.id())
            .filter(|id| !prefix.is_empty() && id.as_uuid().to_string().starts_with(&prefix))
            .collect();

        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(VaultError::snapshot_not_found(query)),
            _ => Err(VaultError::Validation(format!(
                "'{}' matches {} backups; use a longer id",
                query,
                matches.len()
            ))),
        }
    }

    /// The most recent snapshot of any kind
    pub async fn latest_backup(&self) -> Option<Snapshot> {
        self.store.list().await.into_iter().next()
    }

    /// Delete one snapshot; unknown ids are a no-op
    pub async fn delete_backup(&self, id: SnapshotId) -> Durability {
        let durability = self.store.delete(id).await;
        self.report_durability(Operation::DeleteBackup, &durability);
        durability
    }

    /// Delete every snapshot
    pub async fn clear_backups(&self) -> Durability {
        let durability = self.store.clear().await;
        self.report_durability(Operation::DeleteBackup, &durability);
        durability
    }

    /// Counts per kind and the captured time range
    pub async fn stats(&self) -> BackupStats {
        let snapshots = self.store.list().await;
        let mut stats = BackupStats {
            total: snapshots.len(),
            newest: snapshots.first().map(|s| s.timestamp()),
            oldest: snapshots.last().map(|s| s.timestamp()),
            ..BackupStats::default()
        };
        for snapshot in &snapshots {
            match snapshot.kind() {
                SnapshotKind::Auto => stats.auto += 1,
                SnapshotKind::Manual => stats.manual += 1,
                SnapshotKind::Checkpoint => stats.checkpoint += 1,
            }
            stats.payload_bytes += snapshot.payload().size_bytes();
        }
        stats
    }

    /// Check a snapshot against the registered providers without restoring
    pub async fn validate_backup(&self, id: SnapshotId) -> VaultResult<ValidationResult> {
        let snapshot = self.store.get(id).await?;
        let registered = self.collector.provider_names();
        let expected_schema = self.read_config(|c| c.schema_version.clone());

        let (present, missing): (Vec<String>, Vec<String>) = registered
            .iter()
            .cloned()
            .partition(|name| snapshot.payload().slot(name).is_some());
        let unknown = snapshot
            .payload()
            .slot_names()
            .filter(|slot| !registered.iter().any(|name| name == slot))
            .map(str::to_string)
            .collect();

        Ok(ValidationResult {
            schema_version: snapshot.schema_version().to_string(),
            schema_matches: snapshot.schema_version() == expected_schema,
            captured_at: snapshot.timestamp(),
            present,
            missing,
            unknown,
        })
    }

    /// Serialize one snapshot to portable JSON
    pub async fn export_backup(&self, id: SnapshotId) -> VaultResult<String> {
        let snapshot = self.store.get(id).await?;
        serde_json::to_string_pretty(&snapshot)
            .map_err(|e| VaultError::Json(format!("Failed to serialize snapshot: {}", e)))
    }

    /// Import an exported snapshot as a new manual snapshot
    pub async fn import_backup(&self, json: &str) -> VaultResult<BackupReceipt> {
        let snapshot: Snapshot = serde_json::from_str(json)
            .map_err(|e| VaultError::Json(format!("Failed to parse exported snapshot: {}", e)))?;
        let snapshot = snapshot.reissue_as_import();
        let id = snapshot.id();

        let receipt = self.store_snapshot(snapshot, None).await;
        self.report_durability(Operation::ImportBackup, &receipt.durability);
        tracing::info!(%id, "snapshot imported");

        Ok(BackupReceipt {
            id,
            durability: receipt.durability,
            pruned: receipt.pruned,
        })
    }

    /// Change the auto-save interval; a running scheduler restarts with it
    pub fn set_auto_save_interval(self: &Arc<Self>, minutes: u32) -> VaultResult<()> {
        if minutes == 0 {
            let err = VaultError::SchedulerMisconfigured(
                "auto-save interval must be a positive number of minutes".into(),
            );
            self.report_error(Operation::Configure, &err);
            return Err(err);
        }

        let interval = Duration::from_secs(u64::from(minutes) * 60);
        self.write_config(|c| c.auto_save_interval = interval)?;
        if self.scheduler.is_running() {
            self.start_auto_save()?;
        }
        Ok(())
    }

    /// Change the retention bound; applies from the next capture
    pub fn set_max_backups(&self, count: usize) -> VaultResult<()> {
        self.write_config(|c| c.retention = RetentionPolicy::new(count))
    }

    /// Current retention bound
    pub fn max_backups(&self) -> usize {
        self.read_config(|c| c.retention.max_total)
    }

    /// Current auto-save interval
    pub fn auto_save_interval(&self) -> Duration {
        self.read_config(|c| c.auto_save_interval)
    }

    /// Start (or restart) the auto-save scheduler with the current interval
    pub fn start_auto_save(self: &Arc<Self>) -> VaultResult<()> {
        let period = self.auto_save_interval();
        let manager = Arc::downgrade(self);

        self.scheduler.start(period, move || {
            let manager = manager.clone();
            async move {
                let Some(manager) = manager.upgrade() else {
                    return ControlFlow::Break(());
                };
                manager.run_auto_save_tick().await;
                ControlFlow::Continue(())
            }
        })
    }

    /// One scheduler tick: an automatic backup bounded by the tick timeout
    pub async fn run_auto_save_tick(&self) -> AutoBackupOutcome {
        let timeout = self.read_config(|c| c.tick_timeout);
        match tokio::time::timeout(timeout, self.create_auto_backup()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(?timeout, "auto-save tick timed out; skipped");
                AutoBackupOutcome::TimedOut
            }
        }
    }

    /// Stop the auto-save scheduler; idempotent
    pub fn stop_auto_save(&self) {
        self.scheduler.stop();
    }

    pub fn is_auto_save_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Protect a snapshot from retention regardless of its kind
    pub fn pin(&self, id: SnapshotId) {
        if let Ok(mut pinned) = self.pinned.write() {
            pinned.insert(id);
        }
    }

    pub fn unpin(&self, id: SnapshotId) {
        if let Ok(mut pinned) = self.pinned.write() {
            pinned.remove(&id);
        }
    }

    /// Phase of the in-flight restore
    pub fn restore_phase(&self) -> RestorePhase {
        self.phase.lock().map(|p| *p).unwrap_or_default()
    }

    /// Names of the registered providers, in restore order
    pub fn provider_names(&self) -> Vec<String> {
        self.collector.provider_names()
    }

    async fn capture(
        &self,
        kind: SnapshotKind,
        description: Option<String>,
        tags: Vec<String>,
        keep: Option<SnapshotId>,
        operation: Operation,
    ) -> VaultResult<BackupReceipt> {
        let payload = match self.collect_payload().await {
            Ok(payload) => payload,
            Err(e) => {
                self.report_error(operation, &e);
                return Err(e);
            }
        };

        let schema_version = self.read_config(|c| c.schema_version.clone());
        let snapshot = Snapshot::capture(kind, schema_version, payload)
            .with_description(description)
            .with_tags(tags);
        let id = snapshot.id();

        let receipt = self.store_snapshot(snapshot, keep).await;
        self.report_durability(operation, &receipt.durability);
        tracing::info!(%id, %kind, pruned = receipt.pruned.len(), "snapshot created");

        Ok(BackupReceipt {
            id,
            durability: receipt.durability,
            pruned: receipt.pruned,
        })
    }

    /// Providers may block on file I/O, so collection runs off the async
    /// workers; dropping the returned future abandons the payload
    async fn collect_payload(&self) -> VaultResult<Payload> {
        let collector = self.collector.clone();
        tokio::task::spawn_blocking(move || collector.collect())
            .await
            .map_err(|e| VaultError::CollectionFailed {
                provider: "collector".into(),
                reason: format!("Collection task failed: {}", e),
            })?
    }

    async fn store_snapshot(
        &self,
        snapshot: Snapshot,
        keep: Option<SnapshotId>,
    ) -> crate::storage::StoreReceipt {
        let policy = self.read_config(|c| c.retention);
        let mut pinned = self
            .pinned
            .read()
            .map(|p| p.clone())
            .unwrap_or_default();
        pinned.extend(keep);

        self.store
            .insert_with_retention(snapshot, &policy, &pinned)
            .await
    }

    fn set_phase(&self, phase: RestorePhase) {
        if let Ok(mut current) = self.phase.lock() {
            tracing::debug!(from = %*current, to = %phase, "restore phase");
            *current = phase;
        }
    }

    fn read_config<T>(&self, f: impl FnOnce(&ManagerConfig) -> T) -> T {
        match self.config.read() {
            Ok(config) => f(&config),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn write_config(&self, f: impl FnOnce(&mut ManagerConfig)) -> VaultResult<()> {
        let mut config = self
            .config
            .write()
            .map_err(|e| VaultError::Config(format!("Failed to acquire lock: {}", e)))?;
        f(&mut config);
        Ok(())
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

impl Drop for BackupManager {
    fn drop(&mut self) {
        self.scheduler.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryObserver;
    use crate::providers::MemoryProvider;
    use crate::storage::MemoryPersistence;
    use serde_json::json;

    struct Fixture {
        manager: Arc<BackupManager>,
        store: Arc<SnapshotStore>,
        port: Arc<MemoryPersistence>,
        observer: Arc<MemoryObserver>,
        students: Arc<MemoryProvider>,
        subjects: Arc<MemoryProvider>,
        settings: Arc<MemoryProvider>,
    }

    fn fixture_with(max_auto_backups: usize) -> Fixture {
        let students = Arc::new(MemoryProvider::new("students", json!([{"name": "Ada"}])));
        let subjects = Arc::new(MemoryProvider::new("subjects", json!(["Maths"])));
        let settings_provider = Arc::new(MemoryProvider::new("settings", json!({"font": "default"})));
        let collector = PayloadCollector::new()
            .with_provider(settings_provider.clone())
            .unwrap()
            .with_provider(students.clone())
            .unwrap()
            .with_provider(subjects.clone())
            .unwrap();

        let port = Arc::new(MemoryPersistence::new());
        let store = Arc::new(SnapshotStore::new(port.clone(), Duration::from_secs(1)));
        let observer = Arc::new(MemoryObserver::new());
        let settings = Settings {
            max_auto_backups,
            ..Settings::default()
        };
        let manager = BackupManager::new(collector, store.clone(), observer.clone(), &settings).unwrap();

        Fixture {
            manager,
            store,
            port,
            observer,
            students,
            subjects,
            settings: settings_provider,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(50)
    }

    async fn count_kind(store: &SnapshotStore, kind: SnapshotKind) -> usize {
        store.list().await.iter().filter(|s| s.kind() == kind).count()
    }

    #[tokio::test]
    async fn test_create_backup() {
        let f = fixture();
        let receipt = f
            .manager
            .create_backup(Some("End of term".into()), vec!["term".into()], SnapshotKind::Manual)
            .await
            .unwrap();

        assert!(receipt.durability.is_durable());
        let snapshot = f.manager.get_backup(receipt.id).await.unwrap();
        assert_eq!(snapshot.kind(), SnapshotKind::Manual);
        assert_eq!(snapshot.description(), Some("End of term"));
        assert!(snapshot.has_tag("term"));
        assert_eq!(snapshot.payload().slot("students"), Some(&json!([{"name": "Ada"}])));
        assert_eq!(snapshot.schema_version(), "1.0");
    }

    #[tokio::test]
    async fn test_collection_failure_leaves_store_unchanged() {
        let f = fixture();
        f.manager
            .create_backup(None, vec![], SnapshotKind::Manual)
            .await
            .unwrap();
        f.subjects.set_fail_reads(true);

        let err = f
            .manager
            .create_backup(None, vec![], SnapshotKind::Manual)
            .await
            .unwrap_err();

        assert!(matches!(err, VaultError::CollectionFailed { .. }));
        assert_eq!(f.store.len().await, 1);
        assert_eq!(f.observer.events()[0].error_kind, ErrorKind::CollectionFailed);
    }

    #[tokio::test]
    async fn test_five_autos_with_max_three() {
        let f = fixture_with(3);
        let mut ids = Vec::new();
        for _ in 0..5 {
            match f.manager.create_auto_backup().await {
                AutoBackupOutcome::Created(id) => ids.push(id),
                other => panic!("unexpected outcome {:?}", other),
            }
        }

        let kept: Vec<SnapshotId> = f.manager.get_backups().await.iter().map(|s| s.id()).collect();
        assert_eq!(kept, vec![ids[4], ids[3], ids[2]]);
    }

    #[tokio::test]
    async fn test_manual_survives_sixty_autos() {
        let f = fixture_with(50);
        let manual = f
            .manager
            .create_backup(None, vec![], SnapshotKind::Manual)
            .await
            .unwrap();
        let mut autos = Vec::new();
        for _ in 0..60 {
            if let AutoBackupOutcome::Created(id) = f.manager.create_auto_backup().await {
                autos.push(id);
            }
        }

        assert!(f.store.contains(manual.id).await);
        assert_eq!(count_kind(&f.store, SnapshotKind::Auto).await, 49);
        for id in &autos[11..] {
            assert!(f.store.contains(*id).await);
        }
        assert!(!f.store.contains(autos[10]).await);
    }

    #[tokio::test]
    async fn test_zero_max_keeps_no_autos() {
        let f = fixture_with(0);
        for _ in 0..2 {
            assert!(matches!(
                f.manager.create_auto_backup().await,
                AutoBackupOutcome::Created(_)
            ));
        }

        assert_eq!(count_kind(&f.store, SnapshotKind::Auto).await, 0);
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_protected_filling_bound_leaves_no_room_for_autos() {
        let f = fixture_with(1);
        let manual = f
            .manager
            .create_backup(None, vec![], SnapshotKind::Manual)
            .await
            .unwrap();

        let AutoBackupOutcome::Created(auto) = f.manager.create_auto_backup().await else {
            panic!("auto backup failed");
        };

        assert!(f.store.contains(manual.id).await);
        assert!(!f.store.contains(auto).await);
        assert_eq!(count_kind(&f.store, SnapshotKind::Auto).await, 0);
    }

    #[tokio::test]
    async fn test_restore_round_trip_leaves_state_unchanged() {
        let f = fixture();
        let receipt = f
            .manager
            .create_backup(None, vec![], SnapshotKind::Manual)
            .await
            .unwrap();
        let before = (f.students.value(), f.subjects.value(), f.settings.value());

        let report = f.manager.restore_backup(receipt.id).await.unwrap();

        assert_eq!(report.accepted, vec!["settings", "students", "subjects"]);
        assert!(report.missing.is_empty());
        assert_eq!(before, (f.students.value(), f.subjects.value(), f.settings.value()));
    }

    #[tokio::test]
    async fn test_restore_is_loss_safe() {
        let f = fixture();
        let target = f
            .manager
            .create_backup(None, vec![], SnapshotKind::Manual)
            .await
            .unwrap();

        f.students.set(json!([{"name": "Grace"}]));
        let report = f.manager.restore_backup(target.id).await.unwrap();

        assert_eq!(f.students.value(), json!([{"name": "Ada"}]));

        let checkpoint = f.store.get(report.checkpoint).await.unwrap();
        let restored = f.store.get(target.id).await.unwrap();
        assert_eq!(checkpoint.kind(), SnapshotKind::Checkpoint);
        assert!(checkpoint.has_tag(PRE_RESTORE_TAG));
        assert_eq!(checkpoint.payload().slot("students"), Some(&json!([{"name": "Grace"}])));
        assert!(restored.sequence() < checkpoint.sequence());
        assert!(restored.timestamp() <= checkpoint.timestamp());
        assert_eq!(f.manager.restore_phase(), RestorePhase::Idle);
    }

    #[tokio::test]
    async fn test_restore_unknown_id() {
        let f = fixture();
        f.manager
            .create_backup(None, vec![], SnapshotKind::Manual)
            .await
            .unwrap();
        let before = f.port.get(crate::storage::BACKUPS_KEY);

        let err = f.manager.restore_backup(SnapshotId::new()).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(f.store.len().await, 1);
        assert_eq!(count_kind(&f.store, SnapshotKind::Checkpoint).await, 0);
        assert_eq!(f.port.get(crate::storage::BACKUPS_KEY), before);
    }

    #[tokio::test]
    async fn test_restore_aborts_when_checkpoint_fails() {
        let f = fixture();
        let target = f
            .manager
            .create_backup(None, vec![], SnapshotKind::Manual)
            .await
            .unwrap();
        f.students.set(json!([]));
        f.subjects.set_fail_reads(true);

        let err = f.manager.restore_backup(target.id).await.unwrap_err();

        assert!(matches!(err, VaultError::CollectionFailed { .. }));
        assert_eq!(f.students.value(), json!([]));
        assert_eq!(f.store.len().await, 1);
        assert_eq!(f.manager.restore_phase(), RestorePhase::Idle);
    }

    #[tokio::test]
    async fn test_restore_rejected_names_provider() {
        let f = fixture();
        let target = f
            .manager
            .create_backup(None, vec![], SnapshotKind::Manual)
            .await
            .unwrap();
        f.students.set(json!([{"name": "Grace"}]));
        f.subjects.set(json!(["Art"]));
        f.subjects.set_reject_restores(true);

        let err = f.manager.restore_backup(target.id).await.unwrap_err();

        let VaultError::RestoreRejected { rejected, checkpoint } = err else {
            panic!("expected RestoreRejected");
        };
        assert_eq!(rejected, vec!["subjects"]);
        // No automatic rollback: accepted providers keep the restored state
        assert_eq!(f.students.value(), json!([{"name": "Ada"}]));
        assert_eq!(f.subjects.value(), json!(["Art"]));

        let checkpoint_id: SnapshotId = f
            .store
            .list()
            .await
            .into_iter()
            .find(|s| s.has_tag(PRE_RESTORE_TAG))
            .map(|s| s.id())
            .unwrap();
        assert_eq!(checkpoint, checkpoint_id.as_uuid().to_string());
        assert!(f
            .observer
            .events()
            .iter()
            .any(|e| e.error_kind == ErrorKind::RestoreRejected));
    }

    #[tokio::test]
    async fn test_restore_keeps_auto_target_under_tight_retention() {
        let f = fixture_with(1);
        let AutoBackupOutcome::Created(target) = f.manager.create_auto_backup().await else {
            panic!("auto backup failed");
        };

        let report = f.manager.restore_backup(target).await.unwrap();
        assert_eq!(report.target, target);
        assert!(f.store.contains(target).await);
    }

    #[tokio::test]
    async fn test_auto_backup_failure_is_observed() {
        let f = fixture();
        f.students.set_fail_reads(true);

        assert_eq!(f.manager.create_auto_backup().await, AutoBackupOutcome::Failed);

        let events = f.observer.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].operation, Operation::AutoBackup);
        assert_eq!(events[0].error_kind, ErrorKind::CollectionFailed);
    }

    #[tokio::test]
    async fn test_degraded_persistence_is_soft_failure() {
        let f = fixture();
        f.port.set_reject_writes(true);

        let receipt = f
            .manager
            .create_backup(None, vec![], SnapshotKind::Manual)
            .await
            .unwrap();

        assert!(!receipt.durability.is_durable());
        assert!(f.store.contains(receipt.id).await);
        assert_eq!(f.observer.events()[0].error_kind, ErrorKind::PersistenceDegraded);
    }

    #[tokio::test]
    async fn test_delete_backup_twice() {
        let f = fixture();
        let receipt = f
            .manager
            .create_backup(None, vec![], SnapshotKind::Manual)
            .await
            .unwrap();

        assert!(f.manager.delete_backup(receipt.id).await.is_durable());
        assert!(f.manager.delete_backup(receipt.id).await.is_durable());
        assert!(f.manager.get_backups().await.is_empty());
    }

    #[tokio::test]
    async fn test_safety_checkpoint() {
        let f = fixture();
        let receipt = f.manager.create_safety_checkpoint("save failed").await.unwrap();

        let snapshot = f.manager.get_backup(receipt.id).await.unwrap();
        assert_eq!(snapshot.kind(), SnapshotKind::Checkpoint);
        assert!(snapshot.has_tag(ERROR_RECOVERY_TAG));
        assert!(snapshot.description().unwrap().contains("save failed"));
    }

    #[tokio::test]
    async fn test_resolve_short_id() {
        let f = fixture();
        let receipt = f
            .manager
            .create_backup(None, vec![], SnapshotKind::Manual)
            .await
            .unwrap();

        assert_eq!(f.manager.resolve_id(&receipt.id.to_string()).await.unwrap(), receipt.id);
        let full = receipt.id.as_uuid().to_string();
        assert_eq!(f.manager.resolve_id(&full).await.unwrap(), receipt.id);
        assert!(f.manager.resolve_id("snap-zzzzzzzz").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_stats() {
        let f = fixture();
        f.manager.create_backup(None, vec![], SnapshotKind::Manual).await.unwrap();
        f.manager.create_auto_backup().await;
        f.manager.create_auto_backup().await;

        let stats = f.manager.stats().await;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.auto, 2);
        assert_eq!(stats.manual, 1);
        assert_eq!(stats.checkpoint, 0);
        assert!(stats.newest >= stats.oldest);
        assert!(stats.payload_bytes > 0);
    }

    #[tokio::test]
    async fn test_validate_backup() {
        let f = fixture();
        let receipt = f
            .manager
            .create_backup(None, vec![], SnapshotKind::Manual)
            .await
            .unwrap();

        let validation = f.manager.validate_backup(receipt.id).await.unwrap();
        assert!(validation.is_complete());
        assert!(validation.schema_matches);
        assert!(validation.unknown.is_empty());
        assert_eq!(validation.present.len(), 3);
    }

    #[tokio::test]
    async fn test_export_and_import() {
        let f = fixture();
        let receipt = f
            .manager
            .create_backup(Some("Exported".into()), vec![], SnapshotKind::Auto)
            .await
            .unwrap();
        let exported = f.manager.export_backup(receipt.id).await.unwrap();

        let imported = f.manager.import_backup(&exported).await.unwrap();

        assert_ne!(imported.id, receipt.id);
        let snapshot = f.manager.get_backup(imported.id).await.unwrap();
        assert_eq!(snapshot.kind(), SnapshotKind::Manual);
        assert!(snapshot.has_tag("imported"));
        assert_eq!(snapshot.description(), Some("Exported"));
    }

    #[tokio::test]
    async fn test_import_rejects_garbage() {
        let f = fixture();
        assert!(matches!(
            f.manager.import_backup("not a snapshot").await,
            Err(VaultError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_set_max_backups_applies_on_next_capture() {
        let f = fixture_with(10);
        for _ in 0..5 {
            f.manager.create_auto_backup().await;
        }
        f.manager.set_max_backups(2).unwrap();
        assert_eq!(f.store.len().await, 5);

        f.manager.create_auto_backup().await;
        assert_eq!(f.store.len().await, 2);
        assert_eq!(f.manager.max_backups(), 2);
    }

    #[tokio::test]
    async fn test_pinned_auto_survives_pruning() {
        let f = fixture_with(1);
        let AutoBackupOutcome::Created(pinned) = f.manager.create_auto_backup().await else {
            panic!("auto backup failed");
        };
        f.manager.pin(pinned);

        f.manager.create_auto_backup().await;
        f.manager.create_auto_backup().await;
        assert!(f.store.contains(pinned).await);

        f.manager.unpin(pinned);
        f.manager.create_auto_backup().await;
        assert!(!f.store.contains(pinned).await);
    }

    #[tokio::test]
    async fn test_zero_interval_misconfigured() {
        let f = fixture();
        let err = f.manager.set_auto_save_interval(0).unwrap_err();
        assert!(matches!(err, VaultError::SchedulerMisconfigured(_)));
        assert_eq!(f.observer.events()[0].error_kind, ErrorKind::SchedulerMisconfigured);
        assert_eq!(f.manager.auto_save_interval(), Duration::from_secs(300));
    }

    struct SlowProvider {
        delay: Duration,
    }

    impl crate::providers::StateProvider for SlowProvider {
        fn name(&self) -> &str {
            "homeworks"
        }

        fn get_all(&self) -> VaultResult<serde_json::Value> {
            std::thread::sleep(self.delay);
            Ok(json!([]))
        }

        fn replace_all(&self, _slot: serde_json::Value) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_slow_tick_times_out_without_storing() {
        let collector = PayloadCollector::new()
            .with_provider(Arc::new(SlowProvider {
                delay: Duration::from_millis(300),
            }))
            .unwrap();
        let store = Arc::new(SnapshotStore::new(
            Arc::new(MemoryPersistence::new()),
            Duration::from_secs(1),
        ));
        let manager = BackupManager::new(
            collector,
            store.clone(),
            Arc::new(MemoryObserver::new()),
            &Settings::default(),
        )
        .unwrap();
        manager
            .write_config(|c| c.tick_timeout = Duration::from_millis(50))
            .unwrap();

        let started = std::time::Instant::now();
        assert_eq!(manager.run_auto_save_tick().await, AutoBackupOutcome::TimedOut);
        assert!(started.elapsed() < Duration::from_millis(300));
        assert!(store.is_empty().await);

        // The abandoned collection finishes in the background; nothing lands
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_tick_within_timeout_creates_auto() {
        let f = fixture();
        assert!(matches!(
            f.manager.run_auto_save_tick().await,
            AutoBackupOutcome::Created(_)
        ));
        assert_eq!(count_kind(&f.store, SnapshotKind::Auto).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_save_ticks() {
        let f = fixture();
        f.manager.start_auto_save().unwrap();

        tokio::time::sleep(Duration::from_secs(5 * 60 + 1)).await;
        assert_eq!(count_kind(&f.store, SnapshotKind::Auto).await, 1);

        tokio::time::sleep(Duration::from_secs(5 * 60)).await;
        assert_eq!(count_kind(&f.store, SnapshotKind::Auto).await, 2);

        f.manager.stop_auto_save();
        f.manager.stop_auto_save();
        tokio::time::sleep(Duration::from_secs(30 * 60)).await;
        assert_eq!(count_kind(&f.store, SnapshotKind::Auto).await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconfiguring_interval_keeps_one_timer() {
        let f = fixture();
        f.manager.start_auto_save().unwrap();
        for minutes in [1, 2, 3, 4, 10] {
            f.manager.set_auto_save_interval(minutes).unwrap();
        }
        assert!(f.manager.is_auto_save_running());

        tokio::time::sleep(Duration::from_secs(10 * 60 + 1)).await;
        assert_eq!(count_kind(&f.store, SnapshotKind::Auto).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_change_while_stopped_does_not_start() {
        let f = fixture();
        f.manager.set_auto_save_interval(1).unwrap();
        assert!(!f.manager.is_auto_save_running());

        tokio::time::sleep(Duration::from_secs(5 * 60)).await;
        assert_eq!(count_kind(&f.store, SnapshotKind::Auto).await, 0);
    }
}
