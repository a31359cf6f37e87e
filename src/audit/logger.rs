//! Audit logger for the append-only failure log
//!
//! Writes failure events to a log file, one JSON object per line, flushed
//! immediately.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::error::{VaultError, VaultResult};

use super::entry::FailureEvent;
use super::Observer;

/// Handles writing failure events to the audit log file (JSONL)
pub struct AuditLogger {
    /// Path to the audit log file
    log_path: PathBuf,
}

impl AuditLogger {
    /// Create a new AuditLogger that writes to the specified path
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append one event as a JSON line
    pub fn log(&self, event: &FailureEvent) -> VaultResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| VaultError::Io(format!("Failed to open audit log: {}", e)))?;

        let json = serde_json::to_string(event)
            .map_err(|e| VaultError::Json(format!("Failed to serialize audit event: {}", e)))?;

        writeln!(file, "{}", json)
            .map_err(|e| VaultError::Io(format!("Failed to write audit event: {}", e)))?;

        file.flush()
            .map_err(|e| VaultError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// Read all events, oldest first
    pub fn read_all(&self) -> VaultResult<Vec<FailureEvent>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| VaultError::Io(format!("Failed to open audit log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut events = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                VaultError::Io(format!("Failed to read audit log line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let event: FailureEvent = serde_json::from_str(&line).map_err(|e| {
                VaultError::Json(format!(
                    "Failed to parse audit event at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            events.push(event);
        }

        Ok(events)
    }

    /// Read the most recent N events
    pub fn read_recent(&self, count: usize) -> VaultResult<Vec<FailureEvent>> {
        let all = self.read_all()?;
        let start = all.len().saturating_sub(count);
        Ok(all[start..].to_vec())
    }

    /// Get the path to the audit log file
    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}

impl Observer for AuditLogger {
    fn report(&self, event: &FailureEvent) {
        super::trace_event(event);
        if let Err(e) = self.log(event) {
            tracing::warn!(path = %self.log_path.display(), error = %e, "audit log write failed");
        }
    }
}
