//! Backup CLI commands
//!
//! Implements CLI commands for snapshot management.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Subcommand;

use super::context::VaultContext;
use crate::backup::RetentionPolicy;
use crate::display::{format_backup_details, format_backup_list, format_stats};
use crate::error::{VaultError, VaultResult};
use crate::models::{SnapshotId, SnapshotKind};
use crate::storage::Durability;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create a new manual backup
    Create {
        /// Short note shown in listings
        #[arg(short, long)]
        description: Option<String>,

        /// Tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// List all retained backups, newest first
    List {
        /// Only show backups of this kind (auto, manual, checkpoint)
        #[arg(short, long)]
        kind: Option<SnapshotKind>,
    },

    /// Show information about a specific backup
    Show {
        /// Backup ID (use 'latest' for most recent)
        backup: String,
    },

    /// Restore from a backup
    Restore {
        /// Backup ID (use 'latest' for most recent)
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete a backup
    Delete {
        /// Backup ID
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete every backup
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Check a backup against the tracked collections
    Validate {
        /// Backup ID (use 'latest' for most recent)
        backup: String,
    },

    /// Write a backup as portable JSON
    Export {
        /// Backup ID (use 'latest' for most recent)
        backup: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import an exported backup as a new manual backup
    Import {
        /// Path to the exported JSON file
        file: PathBuf,
    },

    /// Show which automatic backups the retention policy would discard
    PrunePreview {
        /// Retention bound to preview (defaults to the configured one)
        #[arg(short, long)]
        max: Option<usize>,
    },

    /// Show backup counts and the retention bound
    Stats,
}

/// Handle a backup command
pub async fn handle_backup_command(ctx: &VaultContext, cmd: BackupCommands) -> VaultResult<()> {
    let manager = &ctx.backups;

    match cmd {
        BackupCommands::Create { description, tags } => {
            let receipt = manager
                .create_backup(description, tags, SnapshotKind::Manual)
                .await?;
            println!("Backup created: {}", receipt.id);
            if !receipt.pruned.is_empty() {
                println!("Pruned {} old automatic backup(s).", receipt.pruned.len());
            }
            warn_if_degraded(&receipt.durability);
        }

        BackupCommands::List { kind } => {
            let mut snapshots = manager.get_backups().await;
            if let Some(kind) = kind {
                snapshots.retain(|s| s.kind() == kind);
            }

            if snapshots.is_empty() {
                println!("No backups found.");
                println!("Create one with: snapvault backup create");
                return Ok(());
            }

            print!("{}", format_backup_list(&snapshots, chrono::Utc::now()));
        }

        BackupCommands::Show { backup } => {
            let id = resolve_backup(ctx, &backup).await?;
            let snapshot = manager.get_backup(id).await?;
            let validation = manager.validate_backup(id).await?;
            print!("{}", format_backup_details(&snapshot, &validation));
        }

        BackupCommands::Restore { backup, force } => {
            let id = resolve_backup(ctx, &backup).await?;
            let validation = manager.validate_backup(id).await?;

            println!("Backup Information");
            println!("==================");
            println!("Backup: {}", id);
            println!(
                "Created: {}",
                validation.captured_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("Schema version: {}", validation.schema_version);
            println!("Status: {}", validation.summary());
            println!();

            if !force {
                println!("WARNING: This will overwrite ALL tracked collections!");
                println!("A checkpoint of the current state is taken first.");
                println!("To proceed, run again with --force flag:");
                println!("  snapvault backup restore {} --force", backup);
                return Ok(());
            }

            println!("Restoring from backup...");
            let report = manager.restore_backup(id).await?;

            println!("Restore complete!");
            println!("{}", report.summary());
            println!("Pre-restore checkpoint: {}", report.checkpoint);
            warn_if_degraded(&report.durability);
        }

        BackupCommands::Delete { backup, force } => {
            let id = resolve_backup(ctx, &backup).await?;

            if !force {
                println!("To delete backup {}, run again with --force flag:", id);
                println!("  snapvault backup delete {} --force", backup);
                return Ok(());
            }

            let durability = manager.delete_backup(id).await;
            println!("Deleted backup: {}", id);
            warn_if_degraded(&durability);
        }

        BackupCommands::Clear { force } => {
            let count = manager.get_backups().await.len();

            if !force {
                println!("This will delete all {} backup(s).", count);
                println!("To proceed, run again with --force flag:");
                println!("  snapvault backup clear --force");
                return Ok(());
            }

            let durability = manager.clear_backups().await;
            println!("Deleted {} backup(s).", count);
            warn_if_degraded(&durability);
        }

        BackupCommands::Validate { backup } => {
            let id = resolve_backup(ctx, &backup).await?;
            let validation = manager.validate_backup(id).await?;

            println!("{}: {}", id, validation.summary());
            if !validation.schema_matches {
                println!(
                    "Schema version {} differs from current {}",
                    validation.schema_version, ctx.settings.payload_schema_version
                );
            }
            if !validation.unknown.is_empty() {
                println!("Untracked slots: {}", validation.unknown.join(", "));
            }
        }

        BackupCommands::Export { backup, output } => {
            let id = resolve_backup(ctx, &backup).await?;
            let json = manager.export_backup(id).await?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json).map_err(|e| {
                        VaultError::Io(format!("Failed to write {}: {}", path.display(), e))
                    })?;
                    println!("Exported {} to {}", id, path.display());
                }
                None => println!("{}", json),
            }
        }

        BackupCommands::Import { file } => {
            let json = std::fs::read_to_string(&file).map_err(|e| {
                VaultError::Io(format!("Failed to read {}: {}", file.display(), e))
            })?;
            let receipt = manager.import_backup(&json).await?;
            println!("Imported backup: {}", receipt.id);
            warn_if_degraded(&receipt.durability);
        }

        BackupCommands::PrunePreview { max } => {
            let policy = RetentionPolicy::new(max.unwrap_or_else(|| manager.max_backups()));
            let snapshots = manager.get_backups().await;
            let plan = policy.plan(&snapshots, &HashSet::new());

            println!("Prune Preview");
            println!("=============");
            println!("Retention bound: {} total", policy.max_total);
            println!(
                "Current backups: {} ({} would be kept)",
                snapshots.len(),
                plan.keep.len()
            );

            if plan.discard.is_empty() {
                println!("No backups would be pruned.");
                return Ok(());
            }

            println!("Would prune {} automatic backup(s):", plan.discard.len());
            for snapshot in snapshots.iter().filter(|s| plan.discard.contains(&s.id())) {
                println!(
                    "  {} ({})",
                    snapshot.id(),
                    snapshot.timestamp().format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
        }

        BackupCommands::Stats => {
            let stats = manager.stats().await;
            print!("{}", format_stats(&stats, manager.max_backups()));
        }
    }

    Ok(())
}

/// Resolve a backup identifier, accepting 'latest'
async fn resolve_backup(ctx: &VaultContext, backup: &str) -> VaultResult<SnapshotId> {
    if backup.eq_ignore_ascii_case("latest") {
        return ctx
            .backups
            .latest_backup()
            .await
            .map(|s| s.id())
            .ok_or_else(|| VaultError::snapshot_not_found("latest"));
    }
    ctx.backups.resolve_id(backup).await
}

pub(crate) fn warn_if_degraded(durability: &Durability) {
    if let Some(reason) = durability.reason() {
        println!("Warning: change not saved to disk ({})", reason);
    }
}
