//! Construction and execution of one external worker invocation.
//!
//! The device-automation driver is a separate executable; the scheduler
//! talks to it over a fixed CLI argument contract plus one environment
//! variable carrying the logical timestamp for log correlation.

use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use fleetcast_core::config::{WorkerConfig, LOGICAL_TIME_ENV};
use fleetcast_core::JobDescriptor;

use crate::error::{Result, RunnerError};

/// A single step of a job: `single_then_multi` engines expand into a
/// [`EngineStep::Single`] invocation followed by a [`EngineStep::Multi`] one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStep {
    Single,
    Multi,
}

impl std::fmt::Display for EngineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineStep::Single => write!(f, "single"),
            EngineStep::Multi => write!(f, "multi"),
        }
    }
}

/// A fully resolved worker command line, ready to spawn.
#[derive(Debug, Clone)]
pub struct WorkerInvocation {
    program: String,
    args: Vec<String>,
    logical_time: Option<String>,
    run_id: Uuid,
}

impl WorkerInvocation {
    /// Build the fixed argument contract for `job`'s `step`.
    pub fn build(
        cfg: &WorkerConfig,
        job: &JobDescriptor,
        step: EngineStep,
        logical_time: Option<String>,
    ) -> Self {
        let mut args = cfg.extra_args.clone();
        args.extend([
            "--device".to_string(),
            job.device_id.clone(),
            "--system".to_string(),
            job.system_key.clone(),
            "--engine".to_string(),
            step.to_string(),
            "--platform".to_string(),
            job.platform.clone(),
        ]);

        let album = match step {
            EngineStep::Single => job.album_intro.as_ref().or(job.album_multi.as_ref()),
            EngineStep::Multi => job.album_multi.as_ref().or(job.album_intro.as_ref()),
        };
        if let Some(album) = album {
            args.push("--album".to_string());
            args.push(album.clone());
        }
        if step == EngineStep::Multi {
            args.push("--count".to_string());
            args.push(job.item_count.to_string());
        }

        // BTreeMap iteration keeps option order stable across invocations.
        for (key, value) in &job.platform_options {
            args.push("--opt".to_string());
            args.push(format!("{key}={value}"));
        }

        Self {
            program: cfg.command.clone(),
            args,
            logical_time,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Spawn the worker and wait for its exit code.
    ///
    /// `kill_on_drop` ties the child to this future: cancelling the
    /// scheduler abandons the in-flight worker rather than orphaning it.
    pub async fn run(&self) -> Result<i32> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref t) = self.logical_time {
            cmd.env(LOGICAL_TIME_ENV, t);
        }

        info!(run = %self.run_id, program = %self.program, "spawning worker");
        debug!(run = %self.run_id, args = ?self.args, "worker arguments");

        let child = cmd
            .spawn()
            .map_err(|e| RunnerError::Spawn(format!("{}: {e}", self.program)))?;

        let output = child.wait_with_output().await?;
        let code = output.status.code().unwrap_or(-1);

        if !output.stdout.is_empty() {
            debug!(run = %self.run_id, "worker stdout: {}", String::from_utf8_lossy(&output.stdout).trim());
        }
        if !output.stderr.is_empty() {
            warn!(run = %self.run_id, "worker stderr: {}", String::from_utf8_lossy(&output.stderr).trim());
        }

        info!(run = %self.run_id, code, "worker exited");
        Ok(code)
    }
}
