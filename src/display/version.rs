//! Version display formatting

use crate::models::Version;

/// Format versions as a table, marking the current one
pub fn format_version_list(versions: &[Version], current: Option<&str>) -> String {
    if versions.is_empty() {
        return "No versions found.".to_string();
    }

    let name_width = versions
        .iter()
        .map(|v| v.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "  {:<name_width$}  {:<12}  {:<16}  {:<6}  {}\n",
        "Name",
        "ID",
        "Created",
        "Stable",
        "Backup",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "  {:-<name_width$}  {:-<12}  {:-<16}  {:-<6}  {:-<13}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for version in versions {
        let marker = if current == Some(version.name.as_str()) {
            "*"
        } else {
            " "
        };
        output.push_str(&format!(
            "{} {:<name_width$}  {:<12}  {:<16}  {:<6}  {}\n",
            marker,
            version.name,
            version.id.to_string(),
            version.created_at.format("%Y-%m-%d %H:%M"),
            if version.is_stable { "yes" } else { "" },
            version.backup_id,
            name_width = name_width,
        ));
    }

    output
}

/// Format a single version with its change notes
pub fn format_version_details(version: &Version) -> String {
    let mut output = String::new();

    output.push_str(&format!("Version: {}\n", version.name));
    output.push_str(&format!("  ID:      {}\n", version.id));
    output.push_str(&format!("  Backup:  {}\n", version.backup_id));
    output.push_str(&format!(
        "  Created: {}\n",
        version.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!(
        "  Stable:  {}\n",
        if version.is_stable { "Yes" } else { "No" }
    ));

    if !version.tags.is_empty() {
        let tags: Vec<&str> = version.tags.iter().map(String::as_str).collect();
        output.push_str(&format!("  Tags:    {}\n", tags.join(", ")));
    }

    if !version.changes.is_empty() {
        output.push_str("\nChanges:\n");
        for change in &version.changes {
            output.push_str(&format!("  - {}\n", change));
        }
    }

    output
}
