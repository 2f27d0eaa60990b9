use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
///
/// Deliberately small: configuration problems are quarantined at load time
/// and job failures are contained behind the dispatch boundary, so the only
/// thing left to go wrong here is persisting the clock control record.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Record store error: {0}")]
    Store(#[from] fleetcast_core::FleetcastError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
