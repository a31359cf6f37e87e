//! Version tagging for SnapVault
//!
//! A version names a checkpoint snapshot. Creating one takes a fresh
//! checkpoint; restoring one restores that checkpoint and adopts the
//! version as current.

mod manager;

pub use manager::{VersionManager, VersionReceipt, VERSION_TAG};
