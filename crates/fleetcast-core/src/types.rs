//! Shared record types.
//!
//! These are the field-level contracts between the operator admin surface
//! (which writes the JSON record files), the scheduler (which re-reads them
//! every pass), and the worker process (which receives them as CLI
//! arguments). All of them are plain data — validation happens once at load
//! time in [`crate::store`], so downstream code never sees a half-formed
//! record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::timeofday::MinuteOfDay;

/// Which posting flow a schedule entry drives on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Post a single item from the intro album.
    Single,
    /// Post a sampled batch of items from the multi album.
    Multi,
    /// Post the intro item first, then the sampled batch.
    SingleThenMulti,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EngineKind::Single => "single",
            EngineKind::Multi => "multi",
            EngineKind::SingleThenMulti => "single_then_multi",
        };
        write!(f, "{s}")
    }
}

/// One row of the schedule: a (device, system) pairing with its posting
/// parameters. Written by the admin surface; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub device_id: String,
    pub system_key: String,
    pub engine: EngineKind,
    /// Album used for the single/intro step.
    #[serde(default)]
    pub album_intro: Option<String>,
    /// Album used for the multi step.
    #[serde(default)]
    pub album_multi: Option<String>,
    /// Statically configured item count for multi engines. May be overridden
    /// by the album's `count_per_post` at catalog time.
    #[serde(default)]
    pub item_count: u32,
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Free-form platform options (e.g. target page), forwarded verbatim to
    /// the worker.
    #[serde(default)]
    pub platform_options: BTreeMap<String, String>,
}

fn default_platform() -> String {
    "WhatsApp".to_string()
}

/// Per-device settings: the enable flag and the minute offset applied to
/// every base time the device uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceProfile {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default)]
    pub offset_minutes: i32,
}

fn bool_true() -> bool {
    true
}

/// A system's ordered list of base times.
///
/// The admin surface historically wrote either a bare array or a
/// `{"times": [...]}` object; both shapes are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeTable {
    Keyed { times: Vec<String> },
    List(Vec<String>),
}

impl TimeTable {
    pub fn times(&self) -> &[String] {
        match self {
            TimeTable::Keyed { times } => times,
            TimeTable::List(times) => times,
        }
    }
}

/// Album metadata used for count resolution and sampler scroll budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumMeta {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    /// Total number of items in the album, when the admin surface knows it.
    #[serde(default)]
    pub total_size: Option<u32>,
    /// Per-post item count override for multi engines.
    #[serde(default)]
    pub count_per_post: Option<u32>,
}

/// Scheduler clock mode, as persisted by the operator control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockMode {
    #[default]
    Auto,
    Manual,
}

/// The persisted clock control record (`clock.json`).
///
/// `time` stays a raw string: a malformed value must degrade to wall-clock
/// behaviour inside the logical clock, not fail the load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClockState {
    #[serde(default)]
    pub mode: ClockMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl ClockState {
    pub fn auto() -> Self {
        Self::default()
    }

    pub fn manual(start: impl Into<String>) -> Self {
        Self {
            mode: ClockMode::Manual,
            time: Some(start.into()),
        }
    }

    /// The manual start time, parsed. `None` in auto mode or when the
    /// persisted value is missing/malformed.
    pub fn manual_start(&self) -> Option<MinuteOfDay> {
        if self.mode != ClockMode::Manual {
            return None;
        }
        self.time.as_deref().and_then(|t| t.parse().ok())
    }
}

/// A concrete scheduled occurrence, recomputed on every catalog pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDescriptor {
    pub device_id: String,
    pub system_key: String,
    pub engine: EngineKind,
    pub album_intro: Option<String>,
    pub album_multi: Option<String>,
    /// Resolved item count (album override applied, clamped to album size).
    pub item_count: u32,
    pub platform: String,
    pub platform_options: BTreeMap<String, String>,
    pub base_time: MinuteOfDay,
    pub offset_minutes: i32,
    pub effective_time: MinuteOfDay,
}

/// Worker exit codes surfaced to the operator log.
///
/// The retry wrapper only distinguishes zero from non-zero; the specific
/// code is logged for diagnosis. Values match the worker CLI contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    /// Device not reachable over the wireless link, or a failure with no
    /// more specific code.
    DeviceUnreachable = 1,
    /// The pre-post reset of the gallery/app state failed.
    ResetFailed = 2,
    /// The target album/collection was not found on the device.
    CollectionNotFound = 4,
    /// Multi-selection mode could not be entered.
    SelectStartFailed = 5,
    /// Fewer items than requested could be selected.
    SelectionShortfall = 6,
    /// The post-action confirmation element never appeared.
    ConfirmNotFound = 7,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Human-readable meaning of a worker exit code, for operator logs.
    pub fn describe(code: i32) -> &'static str {
        match code {
            0 => "success",
            1 => "device unreachable or driver failure",
            2 => "pre-post state reset failed",
            4 => "target collection not found",
            5 => "selection mode entry failed",
            6 => "selection shortfall",
            7 => "confirmation element not found",
            _ => "unknown failure",
        }
    }
}
