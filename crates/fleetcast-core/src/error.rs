use thiserror::Error;

#[derive(Debug, Error)]
pub enum FleetcastError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid time of day: {value}")]
    InvalidTime { value: String },

    #[error("Record file error ({file}): {reason}")]
    Record { file: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FleetcastError>;
