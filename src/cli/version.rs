//! Version CLI commands

use clap::Subcommand;

use super::backup::warn_if_degraded;
use super::context::VaultContext;
use crate::display::{format_version_details, format_version_list};
use crate::error::VaultResult;

/// Version subcommands
#[derive(Subcommand)]
pub enum VersionCommands {
    /// Checkpoint the current state as a named version
    Create {
        /// Version name
        name: String,

        /// Change notes (repeatable)
        #[arg(short, long = "change")]
        changes: Vec<String>,

        /// Tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Mark the version stable and make it current
        #[arg(short, long)]
        stable: bool,
    },

    /// List versions, newest first
    List {
        /// Only show stable versions
        #[arg(short, long)]
        stable: bool,
    },

    /// Show a version and its change notes
    Show {
        /// Version name or ID
        version: String,
    },

    /// Restore the state captured for a version
    Restore {
        /// Version name or ID
        version: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Mark a version stable and make it current
    Stable {
        /// Version name or ID
        version: String,
    },

    /// Show the current version
    Current,
}

/// Handle a version command
pub async fn handle_version_command(ctx: &VaultContext, cmd: VersionCommands) -> VaultResult<()> {
    let manager = &ctx.versions;

    match cmd {
        VersionCommands::Create {
            name,
            changes,
            tags,
            stable,
        } => {
            let receipt = manager.create_version(&name, changes, tags, stable).await?;
            println!("Version created: {} ({})", name.trim(), receipt.id);
            println!("Checkpoint: {}", receipt.backup_id);
            if stable {
                println!("Current version is now {}", name.trim());
            }
            warn_if_degraded(&receipt.durability);
        }

        VersionCommands::List { stable } => {
            let versions = if stable {
                manager.get_stable_versions().await
            } else {
                manager.get_versions().await
            };
            let current = manager.get_current_version().await;

            if versions.is_empty() {
                println!("No versions found.");
                println!("Create one with: snapvault version create <name>");
                return Ok(());
            }

            print!("{}", format_version_list(&versions, current.as_deref()));
        }

        VersionCommands::Show { version } => {
            let id = manager.resolve_id(&version).await?;
            let version = manager.get_version(id).await?;
            print!("{}", format_version_details(&version));
        }

        VersionCommands::Restore { version, force } => {
            let id = manager.resolve_id(&version).await?;
            let record = manager.get_version(id).await?;

            if !force {
                println!(
                    "WARNING: This will overwrite ALL tracked collections with version {}!",
                    record.name
                );
                println!("To proceed, run again with --force flag:");
                println!("  snapvault version restore {} --force", version);
                return Ok(());
            }

            let report = manager.restore_version(id).await?;
            println!("Restored version {}", record.name);
            println!("{}", report.summary());
            println!("Pre-restore checkpoint: {}", report.checkpoint);
            warn_if_degraded(&report.durability);
        }

        VersionCommands::Stable { version } => {
            let id = manager.resolve_id(&version).await?;
            let durability = manager.mark_as_stable(id).await?;
            let record = manager.get_version(id).await?;
            println!("Version {} marked stable and current.", record.name);
            warn_if_degraded(&durability);
        }

        VersionCommands::Current => match manager.get_current_version().await {
            Some(name) => println!("{}", name),
            None => println!("No current version."),
        },
    }

    Ok(())
}
