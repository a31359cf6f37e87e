//! Display formatting for terminal output
//!
//! Formats snapshots, versions and failure events as plain-text tables and
//! detail views.

pub mod backup;
pub mod version;

pub use backup::{format_backup_details, format_backup_list, format_duration, format_size, format_stats};
pub use version::{format_version_details, format_version_list};
