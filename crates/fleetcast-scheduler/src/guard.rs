//! Per-run dedup ledger: one dispatch per (time, device, system) triple.
//!
//! Deliberately in-memory only. A scheduler restart clears the ledger and
//! may re-fire jobs for the current minute — duplicate execution is the
//! accepted price for guaranteed eventual execution after a crash.

use std::collections::HashSet;

use fleetcast_core::MinuteOfDay;

/// Identity of one job occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FireKey {
    pub effective_time: MinuteOfDay,
    pub device_id: String,
    pub system_key: String,
}

impl FireKey {
    pub fn new(
        effective_time: MinuteOfDay,
        device_id: impl Into<String>,
        system_key: impl Into<String>,
    ) -> Self {
        Self {
            effective_time,
            device_id: device_id.into(),
            system_key: system_key.into(),
        }
    }
}

/// The anti-double-fire set, scoped to one process lifetime.
#[derive(Debug, Default)]
pub struct FireGuard {
    fired: HashSet<FireKey>,
}

impl FireGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `key` has not fired yet this run.
    pub fn should_fire(&self, key: &FireKey) -> bool {
        !self.fired.contains(key)
    }

    pub fn mark_fired(&mut self, key: FireKey) {
        self.fired.insert(key);
    }

    /// Combined check-and-mark: true exactly once per key.
    pub fn check_and_mark(&mut self, key: FireKey) -> bool {
        self.fired.insert(key)
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}
