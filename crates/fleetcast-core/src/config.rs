use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Environment variable carrying the logical timestamp into the worker
/// process — replayed jobs log the historical time they represent.
pub const LOGICAL_TIME_ENV: &str = "FLEETCAST_LOGICAL_TIME";

/// Default scheduler tick cadence in seconds.
pub const DEFAULT_TICK_SECS: u64 = 1;
/// Default bounded-retry policy: 5 attempts, 5 s base delay (5/10/20/40/80).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BASE_DELAY_SECS: u64 = 5;

/// Top-level config (fleetcast.toml + FLEETCAST_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FleetcastConfig {
    #[serde(default)]
    pub records: RecordsConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// Where the hot-editable JSON record files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    #[serde(default = "default_records_dir")]
    pub dir: String,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            dir: default_records_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
        }
    }
}

/// Bounded retry with exponential backoff around each worker invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay_secs(),
        }
    }
}

/// The external device-automation worker command.
///
/// The scheduler appends the fixed per-job argument contract after
/// `extra_args`. The command is expected to exit with one of the codes in
/// [`crate::types::ExitCode`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_worker_command")]
    pub command: String,
    /// Fixed arguments inserted before the per-job contract (e.g. a driver
    /// config path).
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            command: default_worker_command(),
            extra_args: Vec::new(),
        }
    }
}

fn default_records_dir() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.fleetcast/records", home)
}
fn default_tick_secs() -> u64 {
    DEFAULT_TICK_SECS
}
fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
fn default_base_delay_secs() -> u64 {
    DEFAULT_BASE_DELAY_SECS
}
fn default_worker_command() -> String {
    "fleetcast-worker".to_string()
}

impl FleetcastConfig {
    /// Load config from a TOML file with FLEETCAST_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.fleetcast/fleetcast.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: FleetcastConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("FLEETCAST_").split("_"))
            .extract()
            .map_err(|e| crate::error::FleetcastError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.fleetcast/fleetcast.toml", home)
}
