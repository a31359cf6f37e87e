//! Durable key-value persistence port
//!
//! The snapshot core writes whole indexes under a fixed set of keys. Any
//! medium that can store bytes per key can back it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::file_io::{read_bytes, write_bytes_atomic};
use crate::error::{VaultError, VaultResult};

/// Key holding the snapshot index
pub const BACKUPS_KEY: &str = "backups";

/// Key holding the version index and current version name
pub const VERSIONS_KEY: &str = "versions";

/// Durable medium consumed by the stores
#[async_trait]
pub trait PersistencePort: Send + Sync {
    /// Read the bytes stored under `key`, `None` if never written
    async fn read(&self, key: &str) -> VaultResult<Option<Vec<u8>>>;

    /// Replace the bytes stored under `key` (last writer wins)
    async fn write(&self, key: &str, bytes: Vec<u8>) -> VaultResult<()>;
}

/// Persistence backed by one `<key>.json` file per key in a directory
#[derive(Debug, Clone)]
pub struct FilePersistence {
    dir: PathBuf,
}

impl FilePersistence {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl PersistencePort for FilePersistence {
    async fn read(&self, key: &str) -> VaultResult<Option<Vec<u8>>> {
        let path = self.path_for(key);
        tokio::task::spawn_blocking(move || read_bytes(path))
            .await
            .map_err(|e| VaultError::Storage(format!("Read task failed: {}", e)))?
    }

    async fn write(&self, key: &str, bytes: Vec<u8>) -> VaultResult<()> {
        let path = self.path_for(key);
        tokio::task::spawn_blocking(move || write_bytes_atomic(path, &bytes))
            .await
            .map_err(|e| VaultError::Storage(format!("Write task failed: {}", e)))?
    }
}

/// In-process persistence; writes can be made to fail to simulate a full
/// or unavailable medium
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    reject_writes: AtomicBool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail (`true`) or succeed again (`false`)
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Raw bytes currently stored under `key`
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }
}

#[async_trait]
impl PersistencePort for MemoryPersistence {
    async fn read(&self, key: &str) -> VaultResult<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire lock: {}", e)))?;
        Ok(entries.get(key).cloned())
    }

    async fn write(&self, key: &str, bytes: Vec<u8>) -> VaultResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(VaultError::Storage("quota exceeded".into()));
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire lock: {}", e)))?;
        entries.insert(key.to_string(), bytes);
        Ok(())
    }
}
