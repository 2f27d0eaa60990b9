//! The dispatch seam between the scheduler and the worker process.
//!
//! The scheduler and the catch-up replayer only see [`Dispatch`]; tests
//! substitute a recording fake, production wires [`WorkerDispatcher`].

use async_trait::async_trait;
use tracing::{info, warn};

use fleetcast_core::config::{RetryConfig, WorkerConfig};
use fleetcast_core::types::EngineKind;
use fleetcast_core::{ExitCode, JobDescriptor, MinuteOfDay};

use crate::retry::{run_with_retries, RetryPolicy};
use crate::worker::{EngineStep, WorkerInvocation};

/// Dispatches one job occurrence and reports its final exit code.
///
/// Implementations never return errors: this boundary converts every
/// failure into a status code (see the retry wrapper), so the scheduler
/// loop cannot be crashed by a job.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Run `job` to completion. `logical_minute` is set when the job is
    /// being replayed for a historical minute and is forwarded to the
    /// worker purely for log correlation.
    async fn dispatch(&self, job: &JobDescriptor, logical_minute: Option<MinuteOfDay>) -> i32;
}

/// Production dispatcher: retry-wrapped external worker invocations.
pub struct WorkerDispatcher {
    worker: WorkerConfig,
    retry: RetryPolicy,
}

impl WorkerDispatcher {
    pub fn new(worker: WorkerConfig, retry: &RetryConfig) -> Self {
        Self {
            worker,
            retry: RetryPolicy::from(retry),
        }
    }

    async fn run_step(
        &self,
        job: &JobDescriptor,
        step: EngineStep,
        logical_time: Option<&str>,
    ) -> i32 {
        let invocation = WorkerInvocation::build(
            &self.worker,
            job,
            step,
            logical_time.map(str::to_string),
        );
        let label = format!("{}/{}/{step}", job.device_id, job.system_key);
        run_with_retries(&label, &self.retry, |_attempt| invocation.run()).await
    }
}

#[async_trait]
impl Dispatch for WorkerDispatcher {
    async fn dispatch(&self, job: &JobDescriptor, logical_minute: Option<MinuteOfDay>) -> i32 {
        // Replayed jobs log the historical minute they represent, with a
        // seconds field for symmetry with live wall-clock logs.
        let logical_time = logical_minute.map(|m| format!("{m}:00"));
        info!(
            device = %job.device_id,
            system = %job.system_key,
            engine = %job.engine,
            platform = %job.platform,
            effective = %job.effective_time,
            logical = logical_time.as_deref().unwrap_or("live"),
            "dispatching job"
        );

        let code = match job.engine {
            EngineKind::Single => {
                self.run_step(job, EngineStep::Single, logical_time.as_deref())
                    .await
            }
            EngineKind::Multi => {
                self.run_step(job, EngineStep::Multi, logical_time.as_deref())
                    .await
            }
            EngineKind::SingleThenMulti => {
                // The multi step only runs once the single step has landed.
                let first = self
                    .run_step(job, EngineStep::Single, logical_time.as_deref())
                    .await;
                if first != 0 {
                    first
                } else {
                    self.run_step(job, EngineStep::Multi, logical_time.as_deref())
                        .await
                }
            }
        };

        if code != 0 {
            warn!(
                device = %job.device_id,
                system = %job.system_key,
                code,
                meaning = ExitCode::describe(code),
                "job failed"
            );
        }
        code
    }
}
