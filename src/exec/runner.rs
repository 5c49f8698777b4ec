// src/exec/runner.rs

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ProcessConfig;
use crate::exec::process;

/// The build → run → wait loop for one build group.
///
/// State machine:
///
/// ```text
/// Building ──build failed──► WaitForSignal ──signal──► Building
///    │
///    └──build ok──► Running ──signal──► Building
///                      │
///                      └──group token cancelled──► Terminated
/// ```
///
/// The runner reacts only to restart signals and cancellation. In
/// particular, the run process exiting on its own (crash or clean exit) is
/// logged by the process layer but does not wake the runner: the group sits
/// with a dead artifact until the watcher reports the next change.
pub struct Runner {
    name: String,
    build: ProcessConfig,
    run: ProcessConfig,
    restart_rx: mpsc::Receiver<()>,
    token: CancellationToken,
}

impl Runner {
    pub fn new(
        name: impl Into<String>,
        build: ProcessConfig,
        run: ProcessConfig,
        restart_rx: mpsc::Receiver<()>,
        token: CancellationToken,
    ) -> Self {
        Self {
            name: name.into(),
            build,
            run,
            restart_rx,
            token,
        }
    }

    /// Loop until the group token is cancelled.
    pub async fn run(mut self) {
        info!(group = %self.name, "runner started");

        loop {
            let outcome = process::run_to_completion(&self.name, "build", &self.build).await;

            if !outcome.is_success() {
                // A failed build is only retried once the watcher observes a
                // change; there is no retry timer.
                tokio::select! {
                    _ = self.token.cancelled() => break,
                    sig = self.restart_rx.recv() => {
                        if sig.is_none() {
                            break;
                        }
                        info!(group = %self.name, "restart signal received");
                        continue;
                    }
                }
            }

            // Per-attempt token: cancelling it kills this run only, while the
            // group token remains live for the next build.
            let run_token = self.token.child_token();
            let run_task = tokio::spawn(process::run_supervised(
                self.name.clone(),
                self.run.clone(),
                run_token.clone(),
            ));

            tokio::select! {
                _ = self.token.cancelled() => {
                    run_token.cancel();
                    let _ = run_task.await;
                    break;
                }
                sig = self.restart_rx.recv() => {
                    run_token.cancel();
                    let _ = run_task.await;
                    if sig.is_none() {
                        break;
                    }
                    info!(group = %self.name, "restart signal received");
                }
            }
        }

        info!(group = %self.name, "runner stopped");
    }
}
