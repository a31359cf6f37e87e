//! Observability port for SnapVault
//!
//! Every failure class the core handles is emitted as a structured
//! [`FailureEvent`] to an [`Observer`]. The core never formats user-facing
//! text; hosts decide how to notify.
//!
//! - `TracingObserver`: emits the event through `tracing`
//! - `AuditLogger`: appends the event to a JSONL file (and traces it)
//! - `MemoryObserver`: keeps events in memory for hosts and tests that
//!   inspect them directly

mod entry;
mod logger;

use std::sync::Mutex;

pub use entry::{FailureEvent, Operation};
pub use logger::AuditLogger;

/// Receiver of structured failure events
pub trait Observer: Send + Sync {
    fn report(&self, event: &FailureEvent);
}

/// Observer that only logs through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn report(&self, event: &FailureEvent) {
        trace_event(event);
    }
}

/// Observer that keeps every event in memory
#[derive(Debug, Default)]
pub struct MemoryObserver {
    events: Mutex<Vec<FailureEvent>>,
}

impl MemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first
    pub fn events(&self) -> Vec<FailureEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Observer for MemoryObserver {
    fn report(&self, event: &FailureEvent) {
        trace_event(event);
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

fn trace_event(event: &FailureEvent) {
    tracing::error!(
        operation = %event.operation,
        error_kind = %event.error_kind,
        context = %event.context,
        "snapshot core failure"
    );
}
