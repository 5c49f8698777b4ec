// src/supervisor.rs

//! Wiring for the build groups.
//!
//! The supervisor owns the root [`CancellationToken`] and, per group, one
//! single-slot restart channel plus a child token. Groups share nothing
//! else: each watcher owns its snapshot memo, each runner its child-process
//! handle. An error or restart in one group is invisible to the others.

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{ConfigFile, GroupConfig};
use crate::exec::Runner;
use crate::watch::Watcher;

#[derive(Debug)]
pub struct Supervisor {
    groups: Vec<(String, GroupConfig)>,
    root: CancellationToken,
}

impl Supervisor {
    /// Build a supervisor over the configured groups, optionally filtered to
    /// a named subset. Selecting zero groups is an error.
    pub fn from_config(cfg: &ConfigFile, filter: &[String]) -> Result<Self> {
        let groups = select_groups(cfg, filter)?;
        Ok(Self {
            groups,
            root: CancellationToken::new(),
        })
    }

    /// The root cancellation token. Cancelling it (idempotently) unwinds
    /// every group: watchers stop polling, runners kill their run processes
    /// and exit.
    pub fn root_token(&self) -> CancellationToken {
        self.root.clone()
    }

    /// Spawn every group's watcher + runner pair and wait for all of them to
    /// terminate naturally after root cancellation.
    pub async fn run(self) -> Result<()> {
        let mut handles = Vec::with_capacity(self.groups.len() * 2);

        for (name, group) in self.groups {
            let heartbeat = group.heartbeat_duration().map_err(|e| anyhow!(e))?;
            let group_token = self.root.child_token();
            let (restart_tx, restart_rx) = mpsc::channel::<()>(1);

            let watcher = Watcher::new(
                name.as_str(),
                group.watch.clone(),
                heartbeat,
                restart_tx,
                group_token.clone(),
            );
            let runner =
                Runner::new(name.as_str(), group.build, group.run, restart_rx, group_token);

            handles.push(tokio::spawn(watcher.run()));
            handles.push(tokio::spawn(runner.run()));
            info!(group = %name, "build group started");
        }

        for handle in handles {
            let _ = handle.await;
        }

        info!("all build groups stopped");
        Ok(())
    }
}

fn select_groups(cfg: &ConfigFile, filter: &[String]) -> Result<Vec<(String, GroupConfig)>> {
    let groups: Vec<(String, GroupConfig)> = if filter.is_empty() {
        cfg.group
            .iter()
            .map(|(name, group)| (name.clone(), group.clone()))
            .collect()
    } else {
        let mut selected = Vec::with_capacity(filter.len());
        for name in filter {
            let group = cfg
                .group
                .get(name)
                .ok_or_else(|| anyhow!("unknown build group '{}'", name))?;
            selected.push((name.clone(), group.clone()));
        }
        selected
    };

    if groups.is_empty() {
        return Err(anyhow!("no build groups selected"));
    }

    Ok(groups)
}
