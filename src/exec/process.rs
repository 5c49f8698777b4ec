// src/exec/process.rs

use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::ProcessConfig;

/// Result of a finished (or unspawnable) process.
///
/// Spawn failures are folded into `Failed(-1)` so callers only have one
/// failure path to handle; the underlying error is logged here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Success,
    Failed(i32),
}

impl ProcessOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, ProcessOutcome::Success)
    }
}

fn command(spec: &ProcessConfig) -> Command {
    let mut cmd = Command::new(&spec.command);
    cmd.args(&spec.args)
        .current_dir(&spec.dir)
        .envs(&spec.env)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    cmd
}

/// Run a process to completion and report its outcome. Used for builds.
pub async fn run_to_completion(group: &str, step: &str, spec: &ProcessConfig) -> ProcessOutcome {
    info!(
        group = %group,
        command = %spec.command,
        args = ?spec.args,
        dir = %spec.dir,
        "{step} started"
    );
    let start = Instant::now();

    let status = match command(spec).status().await {
        Ok(status) => status,
        Err(err) => {
            error!(group = %group, error = %err, "{step} spawn failed");
            return ProcessOutcome::Failed(-1);
        }
    };

    if status.success() {
        info!(group = %group, duration = ?start.elapsed(), "{step} succeeded");
        ProcessOutcome::Success
    } else {
        let code = status.code().unwrap_or(-1);
        error!(
            group = %group,
            exit_code = code,
            duration = ?start.elapsed(),
            "{step} failed"
        );
        ProcessOutcome::Failed(code)
    }
}

/// Run a process until it exits on its own or `token` is cancelled, in which
/// case the child is killed. Used for the run step.
///
/// A non-zero exit (or spawn failure) is logged and otherwise swallowed: a
/// crashed artifact stays dead until the watcher observes the next change.
pub async fn run_supervised(group: String, spec: ProcessConfig, token: CancellationToken) {
    info!(
        group = %group,
        command = %spec.command,
        args = ?spec.args,
        dir = %spec.dir,
        "run started"
    );

    let mut child = match command(&spec).spawn() {
        Ok(child) => child,
        Err(err) => {
            error!(group = %group, error = %err, "run spawn failed");
            return;
        }
    };

    tokio::select! {
        _ = token.cancelled() => {
            if let Err(err) = child.kill().await {
                warn!(group = %group, error = %err, "failed to kill run process");
            }
            info!(group = %group, "run terminated");
        }
        status = child.wait() => {
            match status {
                Ok(status) if status.success() => {
                    info!(group = %group, "run completed");
                }
                Ok(status) => {
                    error!(group = %group, exit_code = ?status.code(), "run failed");
                }
                Err(err) => {
                    error!(group = %group, error = %err, "waiting for run process failed");
                }
            }
        }
    }
}
