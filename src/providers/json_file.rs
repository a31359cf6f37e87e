//! State provider backed by one JSON file per collection

use std::path::PathBuf;

use super::StateProvider;
use crate::error::VaultResult;
use crate::storage::file_io::{read_json, write_json_atomic};

/// A collection stored as a JSON document on disk
///
/// A missing file reads as JSON `null`; restores write atomically.
pub struct JsonFileProvider {
    name: String,
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl StateProvider for JsonFileProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_all(&self) -> VaultResult<serde_json::Value> {
        read_json(&self.path)
    }

    fn replace_all(&self, slot: serde_json::Value) -> bool {
        match write_json_atomic(&self.path, &slot) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(provider = %self.name, error = %e, "failed to write restored collection");
                false
            }
        }
    }
}
