//! Hot-editable JSON record store.
//!
//! The admin surface and operator control panel write five JSON files; the
//! scheduler re-reads them wholesale on every pass so edits take effect
//! without a restart. Load is deliberately tolerant: a missing or corrupt
//! file degrades to an empty collection, and an individual record that fails
//! validation is quarantined (logged and skipped) instead of poisoning the
//! snapshot.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::Result;
use crate::types::{AlbumMeta, ClockState, DeviceProfile, ScheduleEntry, TimeTable};

pub const DEVICES_FILE: &str = "devices.json";
pub const TIMETABLES_FILE: &str = "timetables.json";
pub const SCHEDULE_FILE: &str = "schedule.json";
pub const ALBUMS_FILE: &str = "albums.json";
pub const CLOCK_FILE: &str = "clock.json";

/// One coherent read of all schedule records.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub devices: BTreeMap<String, DeviceProfile>,
    pub systems: BTreeMap<String, TimeTable>,
    pub entries: Vec<ScheduleEntry>,
    pub albums: BTreeMap<String, AlbumMeta>,
}

/// Reads and writes the record files under a single directory.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

#[derive(Deserialize, Default)]
struct DevicesFile {
    #[serde(default)]
    devices: BTreeMap<String, Value>,
}

#[derive(Deserialize, Default)]
struct TimetablesFile {
    #[serde(default)]
    systems: BTreeMap<String, Value>,
}

#[derive(Deserialize, Default)]
struct ScheduleFile {
    #[serde(default)]
    entries: Vec<Value>,
}

#[derive(Deserialize, Default)]
struct AlbumsFile {
    #[serde(default)]
    albums: Vec<Value>,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read every record file. Never fails: unreadable files become empty
    /// collections, invalid records are quarantined with a warning.
    pub fn load_snapshot(&self) -> Snapshot {
        let devices_file: DevicesFile = self.load_file(DEVICES_FILE);
        let timetables_file: TimetablesFile = self.load_file(TIMETABLES_FILE);
        let schedule_file: ScheduleFile = self.load_file(SCHEDULE_FILE);
        let albums_file: AlbumsFile = self.load_file(ALBUMS_FILE);

        let mut snapshot = Snapshot::default();

        for (name, value) in devices_file.devices {
            match serde_json::from_value::<DeviceProfile>(value) {
                Ok(profile) => {
                    snapshot.devices.insert(name, profile);
                }
                Err(e) => warn!(file = DEVICES_FILE, device = %name, "invalid record skipped: {e}"),
            }
        }

        for (key, value) in timetables_file.systems {
            match serde_json::from_value::<TimeTable>(value) {
                Ok(table) => {
                    snapshot.systems.insert(key, table);
                }
                Err(e) => warn!(file = TIMETABLES_FILE, system = %key, "invalid record skipped: {e}"),
            }
        }

        for value in schedule_file.entries {
            match serde_json::from_value::<ScheduleEntry>(value) {
                Ok(entry) => snapshot.entries.push(entry),
                Err(e) => warn!(file = SCHEDULE_FILE, "invalid record skipped: {e}"),
            }
        }

        for value in albums_file.albums {
            match serde_json::from_value::<AlbumMeta>(value) {
                Ok(album) => {
                    snapshot.albums.insert(album.name.clone(), album);
                }
                Err(e) => warn!(file = ALBUMS_FILE, "invalid record skipped: {e}"),
            }
        }

        snapshot
    }

    /// Read the clock control record. Any problem — missing file, bad JSON,
    /// unknown mode — degrades to auto: scheduling must never halt on a bad
    /// configuration value.
    pub fn load_clock_state(&self) -> ClockState {
        let path = self.dir.join(CLOCK_FILE);
        if !path.exists() {
            return ClockState::auto();
        }
        match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(state) => state,
                Err(e) => {
                    warn!(file = CLOCK_FILE, "invalid clock state, falling back to auto: {e}");
                    ClockState::auto()
                }
            },
            Err(e) => {
                warn!(file = CLOCK_FILE, "unreadable clock state, falling back to auto: {e}");
                ClockState::auto()
            }
        }
    }

    /// Persist the clock control record (last-writer-wins).
    pub fn write_clock_state(&self, state: &ClockState) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let raw = serde_json::to_string_pretty(state)?;
        std::fs::write(self.dir.join(CLOCK_FILE), raw)?;
        Ok(())
    }

    fn load_file<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.dir.join(name);
        if !path.exists() {
            return T::default();
        }
        match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(file = name, "unparseable record file, treating as empty: {e}");
                    T::default()
                }
            },
            Err(e) => {
                warn!(file = name, "unreadable record file, treating as empty: {e}");
                T::default()
            }
        }
    }
}
