//! SnapVault - snapshot and version management core
//!
//! This library captures the full state of a homework tracker (students,
//! subjects, homeworks, settings) as point-in-time snapshots, keeps a
//! bounded number of automatic ones, and restores any retained snapshot
//! behind a mandatory checkpoint of the state it overwrites. A thin
//! version-tagging layer names checkpoints as versions.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Snapshot, payload and version models
//! - `providers`: State provider port and payload collection
//! - `storage`: Persistence port and the snapshot/version stores
//! - `audit`: Observability port and the failure audit log
//! - `backup`: Capture, retention, restore and auto-save
//! - `versions`: Version tagging
//! - `cli`: Command handlers and composition root
//! - `display`: Terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use snapvault::cli::VaultContext;
//! use snapvault::config::VaultPaths;
//!
//! let ctx = VaultContext::open(VaultPaths::new()?).await?;
//! let receipt = ctx.versions.create_version("v1", vec![], vec![], true).await?;
//! ```

pub mod audit;
pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod providers;
pub mod storage;
pub mod versions;

pub use error::{VaultError, VaultResult};
