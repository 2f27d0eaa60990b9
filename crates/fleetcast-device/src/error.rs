use thiserror::Error;

use fleetcast_core::ExitCode;

/// Errors surfaced by the device-facing selection layer.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Fewer items than requested could be selected before the empty-page
    /// budget ran out. Non-fatal: indicates a content/availability problem,
    /// not a connectivity one.
    #[error("selection shortfall: {selected}/{requested} items marked")]
    Shortfall { selected: u32, requested: u32 },

    /// The underlying driver/source failed (element lookup, swipe, …).
    #[error("item source error: {0}")]
    Source(String),
}

impl DeviceError {
    /// Map to the worker exit-code contract.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            DeviceError::Shortfall { .. } => ExitCode::SelectionShortfall,
            DeviceError::Source(_) => ExitCode::DeviceUnreachable,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
