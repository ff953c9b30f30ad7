//! Scheduler statistics.
//!
//! Relaxed atomic counters, serialized as plain integers.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// One scheduler event count. Serializes as the bare number.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Counter(AtomicU64);

impl Counter {
    pub(crate) fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-scheduler operation counters.
#[derive(Debug, Default, Serialize)]
pub struct SchedStats {
    /// Successful joins (including duplicate joins).
    pub joins: Counter,
    /// Successful switch calls, handoff or not.
    pub switches: Counter,
    /// Switches that actually handed possession to another member.
    pub handoffs: Counter,
    /// Successful leaves.
    pub leaves: Counter,
    /// Times a caller blocked.
    pub parks: Counter,
    /// Wakes issued to another member.
    pub wakes: Counter,
    pub groups_created: Counter,
    pub groups_destroyed: Counter,
    /// Calls that returned an error.
    pub errors: Counter,
}

impl SchedStats {
    /// Groups currently alive according to the counters.
    pub fn live_groups(&self) -> u64 {
        self.groups_created
            .get()
            .saturating_sub(self.groups_destroyed.get())
    }
}
