// src/watch/watcher.rs

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::watch::snapshot::Snapshot;

/// Polling watcher for one build group.
///
/// Once per heartbeat tick the watcher resolves a fresh [`Snapshot`] and
/// compares it against its memoized previous one. On a difference it sends a
/// single zero-payload restart signal to the group's runner and replaces the
/// memo. The signal channel is single-slot: once one signal is in flight, a
/// further send blocks this loop until the runner consumes it, so changes
/// detected while the runner is mid-build coalesce instead of queueing.
///
/// Empty snapshots are never compared: a tick that resolves zero matches is
/// skipped outright. This guards against spurious restarts when a transient
/// filesystem state (a directory briefly missing mid-build, say) yields no
/// matches. The trade-off is that "all watched files deleted" is never
/// detected as a change.
pub struct Watcher {
    name: String,
    patterns: Vec<String>,
    heartbeat: Duration,
    restart_tx: mpsc::Sender<()>,
    token: CancellationToken,
    memo: Snapshot,
}

impl Watcher {
    pub fn new(
        name: impl Into<String>,
        patterns: Vec<String>,
        heartbeat: Duration,
        restart_tx: mpsc::Sender<()>,
        token: CancellationToken,
    ) -> Self {
        Self {
            name: name.into(),
            patterns,
            heartbeat,
            restart_tx,
            token,
            memo: Snapshot::default(),
        }
    }

    /// Poll until the group token is cancelled.
    ///
    /// The watcher itself never fails: resolution errors are handled inside
    /// [`Snapshot::resolve`] and the only exit condition is cancellation (or
    /// the runner dropping its end of the channel, which only happens during
    /// shutdown).
    pub async fn run(mut self) {
        info!(group = %self.name, heartbeat = ?self.heartbeat, "watcher started");

        self.memo = Snapshot::resolve(&self.patterns);

        let mut tick = time::interval(self.heartbeat);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.token.cancelled() => {
                    info!(group = %self.name, "watcher stopped");
                    return;
                }
                _ = tick.tick() => {}
            }

            let fresh = Snapshot::resolve(&self.patterns);

            if fresh.is_empty() {
                debug!(group = %self.name, "snapshot empty; skipping tick");
                continue;
            }

            if self.memo.is_empty() {
                // First non-empty resolution after an empty start: adopt it
                // without signalling so the group doesn't restart spuriously.
                debug!(group = %self.name, files = fresh.len(), "adopting initial snapshot");
                self.memo = fresh;
                continue;
            }

            if !fresh.differs_from(&self.memo) {
                continue;
            }

            debug!(group = %self.name, files = fresh.len(), "change detected");

            tokio::select! {
                _ = self.token.cancelled() => {
                    info!(group = %self.name, "watcher stopped");
                    return;
                }
                res = self.restart_tx.send(()) => {
                    if res.is_err() {
                        info!(group = %self.name, "runner gone; watcher stopping");
                        return;
                    }
                }
            }

            self.memo = fresh;
        }
    }
}
