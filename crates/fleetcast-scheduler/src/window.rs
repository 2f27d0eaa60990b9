//! Wraparound-aware catch-up window math.
//!
//! The catch-up window `[start, real]` is built from two minute-of-day
//! values with no date attached. When `real < start` the window crossed
//! midnight: the start belongs to the previous day, so it is shifted back a
//! full day, and any job minute that lies "after" the real end must have
//! fired yesterday and is shifted back the same way. The replayer and the
//! live loop share these helpers so both sides agree on eligibility.

use fleetcast_core::timeofday::MINUTES_PER_DAY;
use fleetcast_core::MinuteOfDay;

/// Window endpoints as signed minutes, start shifted to the previous day
/// when the window wraps midnight.
pub fn normalize_window(start: MinuteOfDay, real: MinuteOfDay) -> (i32, i32) {
    let (s, r) = (start.minutes(), real.minutes());
    if r < s {
        (s - MINUTES_PER_DAY, r)
    } else {
        (s, r)
    }
}

/// A job's minute in the normalized window frame: in a wrapped window, a
/// job later in the day than the start happened yesterday.
pub fn adjust_job_minute(job: MinuteOfDay, start: MinuteOfDay, real: MinuteOfDay) -> i32 {
    let j = job.minutes();
    if real.minutes() < start.minutes() && j >= start.minutes() {
        j - MINUTES_PER_DAY
    } else {
        j
    }
}

/// Whether `job` falls inside the closed window `[start, real]`.
pub fn window_contains(job: MinuteOfDay, start: MinuteOfDay, real: MinuteOfDay) -> bool {
    let (s, r) = normalize_window(start, real);
    let j = adjust_job_minute(job, start, real);
    s <= j && j <= r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> MinuteOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn plain_window_contains_interior_minutes() {
        assert!(window_contains(t("09:30"), t("08:00"), t("12:00")));
        assert!(window_contains(t("08:00"), t("08:00"), t("12:00")));
        assert!(window_contains(t("12:00"), t("08:00"), t("12:00")));
        assert!(!window_contains(t("07:59"), t("08:00"), t("12:00")));
        assert!(!window_contains(t("12:01"), t("08:00"), t("12:00")));
    }

    #[test]
    fn wrapped_window_reaches_back_into_yesterday() {
        // Window 15:00 (yesterday) → 00:48 (today).
        let (start, real) = (t("15:00"), t("00:48"));
        assert!(window_contains(t("23:10"), start, real));
        assert!(window_contains(t("00:20"), start, real));
        assert!(window_contains(t("15:00"), start, real));
        assert!(window_contains(t("00:48"), start, real));
        // 14:00 was before the window opened.
        assert!(!window_contains(t("14:00"), start, real));
        // 10:00 today has not happened yet.
        assert!(!window_contains(t("10:00"), start, real));
    }

    #[test]
    fn degenerate_window_is_a_single_minute() {
        assert!(window_contains(t("07:15"), t("07:15"), t("07:15")));
        assert!(!window_contains(t("07:16"), t("07:15"), t("07:15")));
    }

    #[test]
    fn normalized_start_shifts_a_day_back_when_wrapped() {
        assert_eq!(normalize_window(t("15:00"), t("00:48")), (900 - 1440, 48));
        assert_eq!(normalize_window(t("08:00"), t("12:00")), (480, 720));
    }
}
