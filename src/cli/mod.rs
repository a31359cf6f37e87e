//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the backup and version managers.

pub mod backup;
pub mod context;
pub mod version;

pub use backup::{handle_backup_command, BackupCommands};
pub use context::{VaultContext, COLLECTIONS};
pub use version::{handle_version_command, VersionCommands};

use crate::error::{VaultError, VaultResult};

/// Run the auto-save scheduler until Ctrl-C
pub async fn run_watch(ctx: &VaultContext, interval_minutes: Option<u32>) -> VaultResult<()> {
    if !ctx.settings.auto_save_enabled {
        println!("Auto-save is disabled in settings.");
        println!("Enable it with: snapvault config --auto-save true");
        return Ok(());
    }
    if let Some(minutes) = interval_minutes {
        ctx.backups.set_auto_save_interval(minutes)?;
    }

    ctx.backups.start_auto_save()?;
    println!(
        "Auto-saving every {} minute(s), keeping at most {} backups. Press Ctrl-C to stop.",
        ctx.backups.auto_save_interval().as_secs() / 60,
        ctx.backups.max_backups()
    );

    let signal = tokio::signal::ctrl_c().await;
    ctx.backups.stop_auto_save();
    signal.map_err(|e| VaultError::Io(format!("Failed to listen for Ctrl-C: {}", e)))?;

    println!("Auto-save stopped.");
    Ok(())
}

/// Show configuration, or update and save the settings given
pub fn handle_config(
    ctx: &mut VaultContext,
    interval_minutes: Option<u32>,
    max_backups: Option<usize>,
    auto_save: Option<bool>,
    protect_versions: Option<bool>,
) -> VaultResult<()> {
    let changed = interval_minutes.is_some()
        || max_backups.is_some()
        || auto_save.is_some()
        || protect_versions.is_some();

    if let Some(minutes) = interval_minutes {
        ctx.backups.set_auto_save_interval(minutes)?;
        ctx.settings.auto_save_interval_minutes = minutes;
    }
    if let Some(count) = max_backups {
        ctx.backups.set_max_backups(count)?;
        ctx.settings.max_auto_backups = count;
    }
    if let Some(enabled) = auto_save {
        ctx.settings.auto_save_enabled = enabled;
    }
    if let Some(protect) = protect_versions {
        ctx.settings.protect_versioned_snapshots = protect;
    }

    if changed {
        ctx.settings.validate()?;
        ctx.settings.save(&ctx.paths)?;
        println!("Settings saved.");
        println!();
    }

    let settings = &ctx.settings;
    println!("SnapVault Configuration");
    println!("=======================");
    println!("Base directory:  {}", ctx.paths.base_dir().display());
    println!("Data directory:  {}", ctx.paths.data_dir().display());
    println!("Store directory: {}", ctx.paths.store_dir().display());
    println!("Audit log:       {}", ctx.paths.audit_log().display());
    println!();
    println!("Settings:");
    println!("  Auto-save interval:   {} min", settings.auto_save_interval_minutes);
    println!("  Auto-save enabled:    {}", settings.auto_save_enabled);
    println!("  Max backups:          {}", settings.max_auto_backups);
    println!("  Payload schema:       {}", settings.payload_schema_version);
    println!("  Persistence timeout:  {} ms", settings.persistence_timeout_ms);
    println!("  Tick timeout:         {} s", settings.tick_timeout_secs);
    println!(
        "  Protect versioned:    {}",
        settings.protect_versioned_snapshots
    );
    println!();
    println!("Tracked collections: {}", COLLECTIONS.join(", "));
    Ok(())
}

/// Print the most recent failure events
pub fn handle_log(ctx: &VaultContext, count: usize) -> VaultResult<()> {
    let events = ctx.audit.read_recent(count)?;
    if events.is_empty() {
        println!("No failures recorded.");
        return Ok(());
    }

    for event in &events {
        println!("{}", event.format_human_readable());
    }
    Ok(())
}
