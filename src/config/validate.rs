// src/config/validate.rs

use std::net::SocketAddr;

use anyhow::{anyhow, Context, Result};

use crate::config::model::ConfigFile;

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one build group
/// - every group has a non-empty watch list and build/run commands
/// - every heartbeat string parses
/// - proxy / static server bind addresses parse as socket addresses
/// - proxy route upstream hosts parse as URLs
///
/// It does **not** check that watched globs match anything (an empty match
/// set is a legal transient state at runtime) or that commands exist on
/// `$PATH`.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_groups(cfg)?;
    validate_groups(cfg)?;
    validate_servers(cfg)?;
    Ok(())
}

fn ensure_has_groups(cfg: &ConfigFile) -> Result<()> {
    if cfg.group.is_empty() {
        return Err(anyhow!(
            "config must contain at least one [group.<name>] section"
        ));
    }
    Ok(())
}

fn validate_groups(cfg: &ConfigFile) -> Result<()> {
    for (name, group) in cfg.group.iter() {
        if group.watch.is_empty() {
            return Err(anyhow!("group '{}' has an empty `watch` list", name));
        }
        if group.build.command.trim().is_empty() {
            return Err(anyhow!("group '{}' has an empty build command", name));
        }
        if group.run.command.trim().is_empty() {
            return Err(anyhow!("group '{}' has an empty run command", name));
        }
        let heartbeat = group
            .heartbeat_duration()
            .map_err(|e| anyhow!(e))
            .with_context(|| format!("invalid heartbeat for group '{}'", name))?;
        if heartbeat.is_zero() {
            return Err(anyhow!("heartbeat for group '{}' must be positive", name));
        }
    }
    Ok(())
}

fn validate_servers(cfg: &ConfigFile) -> Result<()> {
    if let Some(proxy) = &cfg.proxy {
        proxy
            .bind
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid [proxy] bind address '{}'", proxy.bind))?;

        for (prefix, route) in proxy.route.iter() {
            if !prefix.starts_with('/') {
                return Err(anyhow!(
                    "proxy route prefix '{}' must start with '/'",
                    prefix
                ));
            }
            reqwest::Url::parse(&route.host).with_context(|| {
                format!("invalid upstream host '{}' for route '{}'", route.host, prefix)
            })?;
        }
    }

    if let Some(statics) = &cfg.static_server {
        statics.bind.parse::<SocketAddr>().with_context(|| {
            format!("invalid [static_server] bind address '{}'", statics.bind)
        })?;
        if statics.dir.trim().is_empty() {
            return Err(anyhow!("[static_server] dir must not be empty"));
        }
    }

    Ok(())
}
