//! Backup system for SnapVault
//!
//! Captures the tracked collections as snapshots, keeps a bounded number of
//! automatic ones, and restores any retained snapshot behind a mandatory
//! pre-restore checkpoint.
//!
//! # Architecture
//!
//! - `BackupManager`: creates, lists, restores and deletes snapshots
//! - `RetentionPolicy`: decides which automatic snapshots survive
//! - `AutoSaveScheduler`: the single periodic auto-save task
//!
//! # Retention Policy
//!
//! Manual and checkpoint snapshots are never pruned. Automatic snapshots
//! fill the room `max_total` leaves (default 50), newest first.
//!
//! # Example
//!
//! ```rust,ignore
//! use snapvault::backup::BackupManager;
//! use snapvault::models::SnapshotKind;
//!
//! let manager = BackupManager::new(collector, store, observer, &settings)?;
//! let receipt = manager
//!     .create_backup(Some("End of term".into()), vec![], SnapshotKind::Manual)
//!     .await?;
//!
//! // Later, restore it; the current state is checkpointed first
//! let report = manager.restore_backup(receipt.id).await?;
//! println!("{}", report.summary());
//! ```

mod manager;
mod restore;
pub mod retention;
mod scheduler;

pub use manager::{
    AutoBackupOutcome, BackupManager, BackupReceipt, BackupStats, ERROR_RECOVERY_TAG,
    PRE_RESTORE_TAG,
};
pub use restore::{RestorePhase, RestoreReport, ValidationResult};
pub use retention::{RetentionPlan, RetentionPolicy, DEFAULT_MAX_TOTAL};
pub use scheduler::AutoSaveScheduler;
