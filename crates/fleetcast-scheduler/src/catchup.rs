//! Manual-clock catch-up: synchronously replay every job whose effective
//! time falls between the operator-chosen start and the real "now".
//!
//! Replay scans the full catalog repeatedly until a pass dispatches nothing
//! new. A single linear scan is not enough: dispatching takes real time, and
//! the window's upper bound is the wall clock, so jobs can become eligible
//! while earlier ones run. The fixed point is reached when a whole pass
//! finds no fresh work.
//!
//! The start time captured at entry is the replay's *epoch*. The persisted
//! clock state is re-read before every pass; if the operator switched modes
//! or moved the start mid-replay, the replay aborts and the next scheduler
//! tick starts over against the new state.

use std::collections::HashSet;

use chrono::Local;
use tracing::info;

use fleetcast_core::types::{ClockMode, ClockState};
use fleetcast_core::{JobDescriptor, MinuteOfDay, RecordStore};
use fleetcast_runner::Dispatch;

use crate::catalog::iterate_jobs;
use crate::clock::wall_minute;
use crate::error::Result;
use crate::guard::{FireGuard, FireKey};
use crate::window::window_contains;

/// Result of one replay run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// Jobs dispatched across all passes.
    pub dispatched: usize,
    /// False when the operator invalidated the epoch mid-replay; the clock
    /// state is left untouched so a fresh replay can pick it up.
    pub completed: bool,
}

/// One-shot replayer over a record store and a dispatch seam.
pub struct CatchupReplayer<'a> {
    store: &'a RecordStore,
    dispatcher: &'a dyn Dispatch,
}

impl<'a> CatchupReplayer<'a> {
    pub fn new(store: &'a RecordStore, dispatcher: &'a dyn Dispatch) -> Self {
        Self { store, dispatcher }
    }

    /// Replay the window `[epoch_start, now]` to exhaustion, then hand the
    /// clock back to auto mode.
    ///
    /// Keys replayed here are also marked in `guard` so the first live tick
    /// cannot double-fire the minute the replay just executed.
    pub async fn replay(
        &self,
        epoch_start: MinuteOfDay,
        guard: &mut FireGuard,
    ) -> Result<ReplayOutcome> {
        info!(start = %epoch_start, "manual catch-up starting");

        // Replay-local dedup — intentionally distinct from FireGuard: replay
        // ignores what the live loop already fired.
        let mut replayed: HashSet<FireKey> = HashSet::new();
        let mut dispatched = 0usize;

        loop {
            let state = self.store.load_clock_state();
            if state.mode != ClockMode::Manual || state.manual_start() != Some(epoch_start) {
                info!(start = %epoch_start, "clock state changed mid-replay, aborting this epoch");
                return Ok(ReplayOutcome {
                    dispatched,
                    completed: false,
                });
            }

            // The window end is re-read each pass: "now" advances while jobs run.
            let now = wall_minute(Local::now());
            info!(start = %epoch_start, now = %now, "catch-up pass over window");

            let snapshot = self.store.load_snapshot();
            let mut jobs = iterate_jobs(&snapshot);
            jobs.sort_by_key(|j| j.effective_time);

            let ran = self
                .replay_pass(&jobs, epoch_start, now, &mut replayed, guard)
                .await;
            dispatched += ran;

            if ran == 0 {
                break;
            }
        }

        // Catch-up is a one-shot bounded operation, never a standing mode.
        // The real minute is recorded as the new reference point.
        let final_now = wall_minute(Local::now());
        self.store.write_clock_state(&ClockState {
            mode: ClockMode::Auto,
            time: Some(final_now.to_string()),
        })?;
        info!(dispatched, minute = %final_now, "manual catch-up finished, clock returned to auto");

        Ok(ReplayOutcome {
            dispatched,
            completed: true,
        })
    }

    async fn replay_pass(
        &self,
        jobs: &[JobDescriptor],
        start: MinuteOfDay,
        now: MinuteOfDay,
        replayed: &mut HashSet<FireKey>,
        guard: &mut FireGuard,
    ) -> usize {
        let mut ran = 0usize;

        for job in jobs {
            if !window_contains(job.effective_time, start, now) {
                continue;
            }
            let key =
                FireKey::new(job.effective_time, job.device_id.as_str(), job.system_key.as_str());
            if replayed.contains(&key) {
                continue;
            }

            info!(
                device = %job.device_id,
                system = %job.system_key,
                effective = %job.effective_time,
                "replaying job"
            );
            // Synchronous dispatch, labelled with the historical minute.
            self.dispatcher.dispatch(job, Some(job.effective_time)).await;

            replayed.insert(key.clone());
            guard.mark_fired(key);
            ran += 1;
        }

        ran
    }
}
