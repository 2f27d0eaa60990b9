//! `fleetcast-core` — shared types, configuration, and record storage.
//!
//! Everything the other crates agree on lives here: the `"HH:MM"`
//! minute-of-day arithmetic, the typed record contracts written by the admin
//! surface, the daemon's own TOML configuration, and the tolerant JSON
//! record store the scheduler re-reads every pass.

pub mod config;
pub mod error;
pub mod store;
pub mod timeofday;
pub mod types;

pub use config::FleetcastConfig;
pub use error::{FleetcastError, Result};
pub use store::{RecordStore, Snapshot};
pub use timeofday::MinuteOfDay;
pub use types::{
    AlbumMeta, ClockMode, ClockState, DeviceProfile, EngineKind, ExitCode, JobDescriptor,
    ScheduleEntry, TimeTable,
};
