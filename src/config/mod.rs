//! Configuration module for SnapVault
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Auto-save and retention settings persistence

pub mod paths;
pub mod settings;

pub use paths::VaultPaths;
pub use settings::Settings;
