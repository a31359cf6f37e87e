//! Retention policy
//!
//! Decides which snapshots survive after a new one is added. Manual and
//! checkpoint snapshots (and any pinned id) are always kept; automatic ones
//! fill whatever room `max_total` leaves, newest first.

use std::collections::HashSet;

use crate::models::{Snapshot, SnapshotId};

/// Default bound on retained snapshots
pub const DEFAULT_MAX_TOTAL: usize = 50;

/// Bounded retention of automatic snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Total snapshots the policy aims for; 0 keeps no automatic snapshot
    pub max_total: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_total: DEFAULT_MAX_TOTAL,
        }
    }
}

/// Outcome of a retention pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    pub keep: Vec<SnapshotId>,
    pub discard: Vec<SnapshotId>,
}

impl RetentionPolicy {
    pub fn new(max_total: usize) -> Self {
        Self { max_total }
    }

    /// Split `snapshots` into kept and discarded ids
    ///
    /// `pinned` ids are treated as protected regardless of kind.
    pub fn plan<'a, I>(&self, snapshots: I, pinned: &HashSet<SnapshotId>) -> RetentionPlan
    where
        I: IntoIterator<Item = &'a Snapshot>,
    {
        let (protected, mut auto): (Vec<&Snapshot>, Vec<&Snapshot>) = snapshots
            .into_iter()
            .partition(|s| s.kind().is_protected() || pinned.contains(&s.id()));

        auto.sort_by(|a, b| Snapshot::newest_first(a, b));
        let room = self.max_total.saturating_sub(protected.len());

        let mut plan = RetentionPlan {
            keep: protected.iter().map(|s| s.id()).collect(),
            discard: Vec::new(),
        };
        for (rank, snapshot) in auto.into_iter().enumerate() {
            if rank < room {
                plan.keep.push(snapshot.id());
            } else {
                plan.discard.push(snapshot.id());
            }
        }
        plan
    }

    /// Return the snapshots to keep, newest first
    pub fn prune(&self, snapshots: Vec<Snapshot>) -> Vec<Snapshot> {
        let plan = self.plan(&snapshots, &HashSet::new());
        let discard: HashSet<SnapshotId> = plan.discard.into_iter().collect();

        let mut kept: Vec<Snapshot> = snapshots
            .into_iter()
            .filter(|s| !discard.contains(&s.id()))
            .collect();
        kept.sort_by(Snapshot::newest_first);
        kept
    }
}
