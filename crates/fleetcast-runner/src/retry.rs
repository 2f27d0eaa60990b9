//! Bounded retry with exponential backoff around a single job invocation.
//!
//! Driving a physical device over a flaky wireless link fails
//! nondeterministically, so every worker invocation is wrapped here. This is
//! a hard error boundary: failures come back as status codes, never as
//! errors, so one unrecoverable job can never take the scheduler down.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use fleetcast_core::config::RetryConfig;
use fleetcast_core::ExitCode;

use crate::error::RunnerError;

/// Retry policy: attempt count and backoff base.
///
/// The default (5 attempts, 5 s base) yields delays of 5/10/20/40/80 s.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts,
            base_delay: Duration::from_secs(cfg.base_delay_secs),
        }
    }
}

/// Delay before the retry following `attempt` (1-based): `base * 2^(attempt-1)`.
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    policy.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
}

/// Run `op` until it returns exit code 0 or the policy is exhausted.
///
/// `op` receives the 1-based attempt number and resolves to the worker's
/// exit code, or an error when the invocation itself failed. Both non-zero
/// codes and errors trigger a backoff-and-retry; after the last attempt the
/// final non-zero code is returned (the generic failure code when every
/// attempt errored). Errors are logged, never propagated.
pub async fn run_with_retries<F, Fut>(label: &str, policy: &RetryPolicy, mut op: F) -> i32
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = crate::error::Result<i32>>,
{
    let mut last_code = ExitCode::DeviceUnreachable.code();
    let mut last_error: Option<RunnerError> = None;

    for attempt in 1..=policy.max_attempts {
        info!(label, attempt, max = policy.max_attempts, "running job step");

        match op(attempt).await {
            Ok(0) => {
                info!(label, attempt, "job step succeeded");
                return ExitCode::Success.code();
            }
            Ok(code) => {
                warn!(
                    label,
                    attempt,
                    code,
                    meaning = ExitCode::describe(code),
                    "job step returned non-zero"
                );
                last_code = code;
            }
            Err(e) => {
                warn!(label, attempt, error = %e, "job step failed to run");
                last_code = ExitCode::DeviceUnreachable.code();
                last_error = Some(e);
            }
        }

        if attempt < policy.max_attempts {
            let delay = backoff_delay(policy, attempt);
            info!(label, delay_secs = delay.as_secs(), "retrying after backoff");
            tokio::time::sleep(delay).await;
        }
    }

    error!(
        label,
        attempts = policy.max_attempts,
        code = last_code,
        meaning = ExitCode::describe(last_code),
        "job step exhausted its retry budget"
    );
    if let Some(e) = last_error {
        error!(label, "last invocation error: {e}");
    }
    last_code
}
