//! The steady-state scheduler loop.
//!
//! One tick per second: read the clock control record, expand the catalog
//! from a fresh snapshot, fire whatever is due, and keep the manual-mode
//! machinery honest. Dispatch is serialized — jobs for different devices
//! share one automation resource pool, so nothing runs in parallel here.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::watch;
use tracing::{error, info, warn};

use fleetcast_core::types::{ClockMode, ClockState};
use fleetcast_core::{FleetcastConfig, RecordStore};
use fleetcast_runner::Dispatch;

use crate::catalog::iterate_jobs;
use crate::catchup::CatchupReplayer;
use crate::clock::{wall_minute, LogicalClock};
use crate::error::Result;
use crate::guard::{FireGuard, FireKey};
use crate::window::{adjust_job_minute, normalize_window, window_contains};

/// The scheduler: all mutable scheduling state lives on this one instance,
/// constructed once per process (tests build as many as they like).
pub struct SchedulerEngine {
    store: RecordStore,
    dispatcher: Arc<dyn Dispatch>,
    clock: LogicalClock,
    guard: FireGuard,
    tick: Duration,
    /// One-shot per process lifetime: whether manual catch-up already ran.
    catchup_done: bool,
}

impl SchedulerEngine {
    pub fn new(config: &FleetcastConfig, dispatcher: Arc<dyn Dispatch>) -> Self {
        Self {
            store: RecordStore::new(config.records.dir.clone()),
            dispatcher,
            clock: LogicalClock::new(),
            guard: FireGuard::new(),
            tick: Duration::from_secs(config.scheduler.tick_secs.max(1)),
            catchup_done: false,
        }
    }

    /// Main event loop. Ticks until `shutdown` broadcasts `true`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("scheduler engine started");

        let mut interval = tokio::time::interval(self.tick);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick_at(Local::now()).await {
                        error!("scheduler tick error: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One tick of the loop, at the injected wall-clock instant.
    async fn tick_at(&mut self, now: DateTime<Local>) -> Result<()> {
        let state = self.store.load_clock_state();

        // Manual catch-up, once per process lifetime.
        if state.mode == ClockMode::Manual && !self.catchup_done {
            match state.manual_start() {
                Some(start) => {
                    let replayer = CatchupReplayer::new(&self.store, self.dispatcher.as_ref());
                    let outcome = replayer.replay(start, &mut self.guard).await?;
                    if outcome.completed {
                        self.catchup_done = true;
                    }
                    // Either way, live scheduling resumes on the next tick:
                    // against auto after a completed replay, or against the
                    // operator's new start after an aborted epoch.
                    return Ok(());
                }
                None => {
                    warn!("manual mode with unusable start time, skipping catch-up");
                    self.catchup_done = true;
                }
            }
        }

        let logical = self.clock.current_minute(&state, now);
        let real = wall_minute(now);
        let manual_start = state.manual_start();

        // Wholesale re-read: hot edits to the record files apply next tick.
        let snapshot = self.store.load_snapshot();

        for job in iterate_jobs(&snapshot) {
            let eligible = match manual_start {
                // Manual mode: the job must be inside the historical window
                // AND already reached by the virtual clock.
                Some(start) => {
                    window_contains(job.effective_time, start, real)
                        && job.effective_time == logical
                }
                None => job.effective_time == logical,
            };
            if !eligible {
                continue;
            }

            let key = FireKey::new(job.effective_time, job.device_id.as_str(), job.system_key.as_str());
            if !self.guard.check_and_mark(key) {
                continue;
            }

            info!(
                device = %job.device_id,
                system = %job.system_key,
                effective = %job.effective_time,
                logical = %logical,
                "firing job"
            );
            let logical_tag = manual_start.map(|_| logical);
            self.dispatcher.dispatch(&job, logical_tag).await;
        }

        // Manual mode ends the moment the virtual clock reaches real time.
        if state.mode == ClockMode::Manual {
            let caught_up = match manual_start {
                Some(start) => {
                    let (_, r) = normalize_window(start, real);
                    adjust_job_minute(logical, start, real) >= r
                }
                // Unusable start already degraded to wall-clock behaviour.
                None => true,
            };
            if caught_up {
                info!(minute = %real, "virtual clock caught up, returning to auto");
                self.store.write_clock_state(&ClockState {
                    mode: ClockMode::Auto,
                    time: Some(real.to_string()),
                })?;
            }
        }

        Ok(())
    }
}
