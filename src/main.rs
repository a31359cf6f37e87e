use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use snapvault::cli::{
    handle_backup_command, handle_config, handle_log, handle_version_command, run_watch,
    BackupCommands, VaultContext, VersionCommands,
};
use snapvault::config::VaultPaths;
use snapvault::error::VaultError;

#[derive(Parser)]
#[command(
    name = "snapvault",
    author = "Kaylee Beyene",
    version,
    about = "Snapshot and version management for homework tracker data",
    long_about = "SnapVault captures the tracked collections (students, subjects, \
                  homeworks, settings) as snapshots, keeps a bounded number of \
                  automatic ones, and restores any of them behind a safety \
                  checkpoint of the current state."
)]
struct Cli {
    /// Base directory for settings, collections and the snapshot store
    #[arg(long, env = "SNAPVAULT_DATA_DIR", global = true)]
    data_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Backup management commands
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Version management commands
    #[command(subcommand, alias = "ver")]
    Version(VersionCommands),

    /// Run automatic backups until Ctrl-C
    Watch {
        /// Minutes between automatic backups
        #[arg(short, long)]
        interval: Option<u32>,
    },

    /// Show or change configuration
    Config {
        /// Minutes between automatic backups
        #[arg(long)]
        interval: Option<u32>,

        /// Upper bound on retained backups
        #[arg(long)]
        max_backups: Option<usize>,

        /// Enable or disable auto-save
        #[arg(long)]
        auto_save: Option<bool>,

        /// Protect snapshots referenced by versions from pruning
        #[arg(long)]
        protect_versions: Option<bool>,
    },

    /// Show recent failures from the audit log
    Log {
        /// Number of events to show
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = match cli.data_dir {
        Some(dir) => VaultPaths::with_base_dir(dir),
        None => VaultPaths::new()?,
    };
    let mut ctx = VaultContext::open(paths).await?;

    let result = match cli.command {
        Some(Commands::Backup(cmd)) => handle_backup_command(&ctx, cmd).await,
        Some(Commands::Version(cmd)) => handle_version_command(&ctx, cmd).await,
        Some(Commands::Watch { interval }) => run_watch(&ctx, interval).await,
        Some(Commands::Config {
            interval,
            max_backups,
            auto_save,
            protect_versions,
        }) => handle_config(&mut ctx, interval, max_backups, auto_save, protect_versions),
        Some(Commands::Log { count }) => handle_log(&ctx, count),
        None => {
            println!("SnapVault - snapshot and version management");
            println!();
            println!("Run 'snapvault --help' for usage information.");
            Ok(())
        }
    };

    if let Err(e) = &result {
        if needs_safety_checkpoint(e) {
            match ctx.backups.create_safety_checkpoint(&e.to_string()).await {
                Ok(receipt) => eprintln!("Safety checkpoint saved: {}", receipt.id),
                Err(checkpoint_err) => {
                    tracing::warn!(error = %checkpoint_err, "safety checkpoint failed")
                }
            }
        }
    }

    result.map_err(Into::into)
}

/// Application failures get a checkpoint; user input errors do not
fn needs_safety_checkpoint(error: &VaultError) -> bool {
    !matches!(
        error,
        VaultError::NotFound { .. }
            | VaultError::Validation(_)
            | VaultError::Duplicate { .. }
            | VaultError::Config(_)
            | VaultError::SchedulerMisconfigured(_)
            | VaultError::CollectionFailed { .. }
    )
}
