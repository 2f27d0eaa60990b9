//! `fleetcast-runner` — job execution: bounded retry, worker invocation,
//! and the dispatch seam the scheduler drives.
//!
//! Failure containment is the organising rule here: everything past
//! [`dispatch::Dispatch`] reports status codes, never errors, so a job that
//! fails every retry leaves nothing behind but log lines.

pub mod dispatch;
pub mod error;
pub mod retry;
pub mod worker;

pub use dispatch::{Dispatch, WorkerDispatcher};
pub use error::{Result, RunnerError};
pub use retry::{backoff_delay, run_with_retries, RetryPolicy};
pub use worker::{EngineStep, WorkerInvocation};
