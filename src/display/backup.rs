//! Backup display formatting
//!
//! Formats snapshots for terminal output in table and detail views.

use chrono::{DateTime, Utc};

use crate::backup::{BackupStats, ValidationResult};
use crate::models::Snapshot;

/// Format a list of snapshots as a table, newest first
pub fn format_backup_list(snapshots: &[Snapshot], now: DateTime<Utc>) -> String {
    if snapshots.is_empty() {
        return "No backups found.".to_string();
    }

    let desc_width = snapshots
        .iter()
        .map(|s| s.description().map_or(0, str::len))
        .max()
        .unwrap_or(11)
        .clamp(11, 40);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<13}  {:<10}  {:>6}  {:>9}  {:<desc_width$}  {}\n",
        "ID",
        "Kind",
        "Age",
        "Size",
        "Description",
        "Tags",
        desc_width = desc_width,
    ));
    output.push_str(&format!(
        "{:-<13}  {:-<10}  {:->6}  {:->9}  {:-<desc_width$}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        desc_width = desc_width,
    ));

    for snapshot in snapshots {
        let description = snapshot.description().unwrap_or("");
        let description = if description.len() > desc_width {
            format!("{}...", truncate(description, desc_width - 3))
        } else {
            description.to_string()
        };
        let tags: Vec<&str> = snapshot.tags().iter().map(String::as_str).collect();

        output.push_str(&format!(
            "{:<13}  {:<10}  {:>6}  {:>9}  {:<desc_width$}  {}\n",
            snapshot.id().to_string(),
            snapshot.kind().to_string(),
            format_duration(now.signed_duration_since(snapshot.timestamp())),
            format_size(snapshot.payload().size_bytes() as u64),
            description,
            tags.join(", "),
            desc_width = desc_width,
        ));
    }

    output.push_str(&format!("\nTotal: {} backup(s)\n", snapshots.len()));
    output
}

/// Format one snapshot with its validation against the registered providers
pub fn format_backup_details(snapshot: &Snapshot, validation: &ValidationResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Backup: {}\n", snapshot.id()));
    output.push_str(&format!("  Full ID:   {}\n", snapshot.id().as_uuid()));
    output.push_str(&format!("  Kind:      {}\n", snapshot.kind()));
    output.push_str(&format!(
        "  Created:   {}\n",
        snapshot.timestamp().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!(
        "  Schema:    {}{}\n",
        snapshot.schema_version(),
        if validation.schema_matches {
            ""
        } else {
            " (differs from current)"
        }
    ));
    output.push_str(&format!(
        "  Size:      {}\n",
        format_size(snapshot.payload().size_bytes() as u64)
    ));

    if let Some(description) = snapshot.description() {
        output.push_str(&format!("  Note:      {}\n", description));
    }
    if !snapshot.tags().is_empty() {
        let tags: Vec<&str> = snapshot.tags().iter().map(String::as_str).collect();
        output.push_str(&format!("  Tags:      {}\n", tags.join(", ")));
    }

    output.push_str("\nContents:\n");
    for name in &validation.present {
        output.push_str(&format!("  {:<14} Yes\n", name));
    }
    for name in &validation.missing {
        output.push_str(&format!("  {:<14} No\n", name));
    }
    for name in &validation.unknown {
        output.push_str(&format!("  {:<14} (no provider)\n", name));
    }

    output.push_str(&format!("\nStatus: {}\n", validation.summary()));
    output
}

/// Format snapshot counts and the retention bound
pub fn format_stats(stats: &BackupStats, max_total: usize) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Backups: {} ({} auto, {} manual, {} checkpoint)\n",
        stats.total, stats.auto, stats.manual, stats.checkpoint
    ));
    output.push_str(&format!("Retention: {} total\n", max_total));
    output.push_str(&format!(
        "Payload size: {}\n",
        format_size(stats.payload_bytes as u64)
    ));
    if let (Some(newest), Some(oldest)) = (stats.newest, stats.oldest) {
        output.push_str(&format!(
            "Range: {} .. {}\n",
            oldest.format("%Y-%m-%d %H:%M"),
            newest.format("%Y-%m-%d %H:%M")
        ));
    }
    output
}

/// Format a duration in human-readable form
pub fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    format!("{}mo", days / 30)
}

/// Format a byte count in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
