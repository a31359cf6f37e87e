//! User settings for SnapVault
//!
//! Manages the auto-save cadence, retention bound and persistence
//! timeouts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::VaultPaths;
use crate::error::VaultError;

/// SnapVault settings, stored as `config.json` in the base directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version of this settings file
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Minutes between automatic backups
    #[serde(default = "default_auto_save_interval")]
    pub auto_save_interval_minutes: u32,

    /// Whether the auto-save scheduler runs at all
    #[serde(default = "default_true")]
    pub auto_save_enabled: bool,

    /// Upper bound on retained snapshots; only automatic ones are pruned
    #[serde(default = "default_max_auto_backups")]
    pub max_auto_backups: usize,

    /// Structural version tag written into every new snapshot
    #[serde(default = "default_payload_schema_version")]
    pub payload_schema_version: String,

    /// Bound on a single durable write
    #[serde(default = "default_persistence_timeout_ms")]
    pub persistence_timeout_ms: u64,

    /// Bound on a single auto-save tick
    #[serde(default = "default_tick_timeout_secs")]
    pub tick_timeout_secs: u64,

    /// Treat snapshots referenced by a version as protected from pruning
    #[serde(default)]
    pub protect_versioned_snapshots: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_auto_save_interval() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_max_auto_backups() -> usize {
    50
}

fn default_payload_schema_version() -> String {
    "1.0".to_string()
}

fn default_persistence_timeout_ms() -> u64 {
    2_000
}

fn default_tick_timeout_secs() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            auto_save_interval_minutes: default_auto_save_interval(),
            auto_save_enabled: default_true(),
            max_auto_backups: default_max_auto_backups(),
            payload_schema_version: default_payload_schema_version(),
            persistence_timeout_ms: default_persistence_timeout_ms(),
            tick_timeout_secs: default_tick_timeout_secs(),
            protect_versioned_snapshots: false,
        }
    }
}

impl Settings {
    /// Auto-save period as a Duration
    pub fn auto_save_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.auto_save_interval_minutes) * 60)
    }

    /// Persistence write timeout as a Duration
    pub fn persistence_timeout(&self) -> Duration {
        Duration::from_millis(self.persistence_timeout_ms)
    }

    /// Auto-save tick timeout as a Duration
    pub fn tick_timeout(&self) -> Duration {
        Duration::from_secs(self.tick_timeout_secs)
    }

    /// Reject values the scheduler and store cannot run with
    pub fn validate(&self) -> Result<(), VaultError> {
        if self.auto_save_interval_minutes == 0 {
            return Err(VaultError::SchedulerMisconfigured(
                "auto_save_interval_minutes must be a positive integer".into(),
            ));
        }
        if self.persistence_timeout_ms == 0 {
            return Err(VaultError::Config(
                "persistence_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.tick_timeout_secs == 0 {
            return Err(VaultError::Config(
                "tick_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.payload_schema_version.trim().is_empty() {
            return Err(VaultError::Config(
                "payload_schema_version must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Load settings from disk, or use defaults if the file doesn't exist
    pub fn load_or_create(paths: &VaultPaths) -> Result<Self, VaultError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| VaultError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| VaultError::Config(format!("Failed to parse settings file: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &VaultPaths) -> Result<(), VaultError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| VaultError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| VaultError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
