//! State provider port and payload collector
//!
//! Each tracked collection (students, subjects, homeworks, settings, ...)
//! is a [`StateProvider`]. The [`PayloadCollector`] reads every provider
//! into one [`Payload`] and hands slots back on restore.
//!
//! # Restore order
//!
//! Slots are handed back in provider **registration order**. Hosts whose
//! collections depend on each other register them dependency-first.

mod json_file;
mod memory;

use std::sync::Arc;

pub use json_file::JsonFileProvider;
pub use memory::MemoryProvider;

use crate::error::{VaultError, VaultResult};
use crate::models::Payload;

/// One tracked domain collection
pub trait StateProvider: Send + Sync {
    /// Slot name used in payloads; unique per collector
    fn name(&self) -> &str;

    /// Current state of the collection; must not mutate it
    fn get_all(&self) -> VaultResult<serde_json::Value>;

    /// Replace the whole collection; `false` if the slot is refused
    fn replace_all(&self, slot: serde_json::Value) -> bool;
}

/// What happened to each slot during a restore
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotOutcome {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
    /// Providers with no slot in the snapshot; left untouched
    pub missing: Vec<String>,
}

impl SlotOutcome {
    /// True when no provider refused its slot
    pub fn all_accepted(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Reads and restores every registered provider as one unit
#[derive(Default, Clone)]
pub struct PayloadCollector {
    providers: Vec<Arc<dyn StateProvider>>,
}

impl PayloadCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider; names must be unique
    pub fn register(&mut self, provider: Arc<dyn StateProvider>) -> VaultResult<()> {
        if self.providers.iter().any(|p| p.name() == provider.name()) {
            return Err(VaultError::Duplicate {
                entity_type: "State provider",
                identifier: provider.name().to_string(),
            });
        }
        self.providers.push(provider);
        Ok(())
    }

    /// Builder form of [`PayloadCollector::register`]
    pub fn with_provider(mut self, provider: Arc<dyn StateProvider>) -> VaultResult<Self> {
        self.register(provider)?;
        Ok(self)
    }

    /// Registered slot names, in restore order
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Read every provider into one payload
    ///
    /// The first failing provider aborts the whole collection.
    pub fn collect(&self) -> VaultResult<Payload> {
        let mut payload = Payload::new();
        for provider in &self.providers {
            let slot = provider
                .get_all()
                .map_err(|e| VaultError::CollectionFailed {
                    provider: provider.name().to_string(),
                    reason: e.to_string(),
                })?;
            payload.insert(provider.name(), slot);
        }
        Ok(payload)
    }

    /// Hand each slot of `payload` back to its provider, in registration order
    pub fn apply(&self, payload: &Payload) -> SlotOutcome {
        let mut outcome = SlotOutcome::default();
        for provider in &self.providers {
            let name = provider.name().to_string();
            match payload.slot(&name) {
                None => {
                    tracing::warn!(provider = %name, "snapshot has no slot for provider");
                    outcome.missing.push(name);
                }
                Some(slot) => {
                    if provider.replace_all(slot.clone()) {
                        outcome.accepted.push(name);
                    } else {
                        tracing::warn!(provider = %name, "provider rejected restored slot");
                        outcome.rejected.push(name);
                    }
                }
            }
        }
        outcome
    }
}
