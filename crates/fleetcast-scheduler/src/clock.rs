//! The logical clock: real time, or an operator-rewound virtual time.
//!
//! In auto mode this is a plain wall-clock read. In manual mode a virtual
//! timestamp starts at the operator-chosen time and advances at 1:1 rate
//! with real time. Advancement only consumes whole real minutes — the
//! remainder seconds stay accounted against the anchor, so no virtual
//! minute is ever skipped under slow or irregular polling.

use chrono::{DateTime, Duration, Local, Timelike};
use tracing::warn;

use fleetcast_core::types::{ClockMode, ClockState};
use fleetcast_core::MinuteOfDay;

/// The minute-of-day of a wall-clock instant.
pub fn wall_minute(now: DateTime<Local>) -> MinuteOfDay {
    MinuteOfDay::from_minutes((now.hour() * 60 + now.minute()) as i32)
}

/// Produces the current scheduling minute.
///
/// One instance per scheduler engine — the virtual-clock progress lives in
/// these fields, so independent engines (and tests) never share state.
#[derive(Debug, Default)]
pub struct LogicalClock {
    virtual_minute: Option<MinuteOfDay>,
    /// Real instant the virtual minute was last advanced to. Whole minutes
    /// only; leftover seconds remain pending here.
    anchor: Option<DateTime<Local>>,
    /// Persisted (mode, raw time) observed last call — a change re-seeds
    /// the virtual clock.
    last_state: Option<(ClockMode, String)>,
}

impl LogicalClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current logical minute given the persisted clock state and the real
    /// time `now`.
    pub fn current_minute(&mut self, state: &ClockState, now: DateTime<Local>) -> MinuteOfDay {
        if state.mode != ClockMode::Manual {
            // Auto mode discards any virtual progress immediately.
            self.virtual_minute = None;
            self.anchor = None;
            self.last_state = None;
            return wall_minute(now);
        }

        let raw = state.time.as_deref().unwrap_or("").trim().to_string();
        let key = (ClockMode::Manual, raw.clone());

        if self.virtual_minute.is_none() || self.last_state.as_ref() != Some(&key) {
            // First observation, or the operator changed the start time:
            // re-seed the virtual clock.
            let start = match raw.parse::<MinuteOfDay>() {
                Ok(t) => t,
                Err(_) => {
                    // Bad configuration must never halt scheduling.
                    warn!(value = %raw, "malformed manual start time, using wall clock");
                    wall_minute(now)
                }
            };
            self.virtual_minute = Some(start);
            self.anchor = Some(now);
            self.last_state = Some(key);
            return start;
        }

        let anchor = self.anchor.unwrap_or(now);
        let elapsed = (now - anchor).num_seconds();
        if elapsed >= 60 {
            let minutes = elapsed / 60;
            let advanced = self
                .virtual_minute
                .map(|m| m.add_minutes(minutes as i32))
                .unwrap_or_else(|| wall_minute(now));
            self.virtual_minute = Some(advanced);
            // Keep the sub-minute remainder pending against the anchor.
            self.anchor = Some(anchor + Duration::seconds(minutes * 60));
        }

        self.virtual_minute.unwrap_or_else(|| wall_minute(now))
    }
}
