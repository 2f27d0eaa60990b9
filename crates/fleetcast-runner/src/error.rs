use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    /// The worker process could not be started at all.
    #[error("worker spawn failed: {0}")]
    Spawn(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
