//! In-process state provider

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use super::StateProvider;
use crate::error::{VaultError, VaultResult};

/// A collection held in memory by the host
///
/// Reads and restores can be made to fail, which is how hosts simulate a
/// locked or validating collection.
pub struct MemoryProvider {
    name: String,
    value: RwLock<serde_json::Value>,
    fail_reads: AtomicBool,
    reject_restores: AtomicBool,
    restore_log: Option<Arc<Mutex<Vec<String>>>>,
}

impl MemoryProvider {
    pub fn new(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            value: RwLock::new(value),
            fail_reads: AtomicBool::new(false),
            reject_restores: AtomicBool::new(false),
            restore_log: None,
        }
    }

    /// Record this provider's name into `log` on every accepted restore
    pub fn with_restore_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.restore_log = Some(log);
        self
    }

    /// Current value of the collection
    pub fn value(&self) -> serde_json::Value {
        self.value
            .read()
            .map(|v| v.clone())
            .unwrap_or(serde_json::Value::Null)
    }

    /// Overwrite the collection, as the host application would
    pub fn set(&self, value: serde_json::Value) {
        if let Ok(mut current) = self.value.write() {
            *current = value;
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_reject_restores(&self, reject: bool) {
        self.reject_restores.store(reject, Ordering::SeqCst);
    }
}

impl StateProvider for MemoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_all(&self) -> VaultResult<serde_json::Value> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(VaultError::Storage(format!("{} is unavailable", self.name)));
        }
        self.value
            .read()
            .map(|v| v.clone())
            .map_err(|e| VaultError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn replace_all(&self, slot: serde_json::Value) -> bool {
        if self.reject_restores.load(Ordering::SeqCst) {
            return false;
        }
        let Ok(mut current) = self.value.write() else {
            return false;
        };
        *current = slot;
        if let Some(log) = &self.restore_log {
            if let Ok(mut log) = log.lock() {
                log.push(self.name.clone());
            }
        }
        true
    }
}
