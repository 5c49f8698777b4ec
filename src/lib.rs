// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod serve;
pub mod supervisor;
pub mod watch;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::loader::{default_config, load_and_validate, save_to_path};
use crate::config::model::ConfigFile;
use crate::supervisor::Supervisor;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (or `--init-config` scaffolding)
/// - one watcher + runner pair per selected build group
/// - the reverse proxy and static file server, when configured
/// - Ctrl-C handling via the root cancellation token
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);

    if args.init_config {
        let cfg = default_config();
        save_to_path(&cfg, &config_path)?;
        println!("wrote default config to {}", config_path.display());
        return Ok(());
    }

    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let supervisor = Supervisor::from_config(&cfg, &args.group)?;
    let root = supervisor.root_token();

    // Ctrl-C → root cancellation. Cancelling is idempotent, so a second
    // interrupt while shutdown is in flight is harmless.
    {
        let root = root.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("interrupt received, shutting down");
            root.cancel();
        });
    }

    let tls = serve::tls_files(&cfg);
    let mut servers = Vec::new();

    if let Some(proxy_cfg) = cfg.proxy.clone() {
        let tls = tls.clone();
        let token = root.clone();
        servers.push(tokio::spawn(async move {
            if let Err(err) = serve::proxy::run_proxy(proxy_cfg, tls, token).await {
                error!(error = %err, "reverse proxy failed");
            }
        }));
    }

    if let Some(static_cfg) = cfg.static_server.clone() {
        let tls = tls.clone();
        let token = root.clone();
        servers.push(tokio::spawn(async move {
            if let Err(err) = serve::static_files::run_static(static_cfg, tls, token).await {
                error!(error = %err, "static server failed");
            }
        }));
    }

    supervisor.run().await?;

    for server in servers {
        let _ = server.await;
    }

    Ok(())
}

/// Simple dry-run output: print groups, routes and the static server.
fn print_dry_run(cfg: &ConfigFile) {
    println!("watchrun dry-run");
    if !cfg.name.is_empty() {
        println!("  name: {}", cfg.name);
    }
    if !cfg.description.is_empty() {
        println!("  description: {}", cfg.description);
    }
    println!();

    println!("groups ({}):", cfg.group.len());
    for (name, group) in cfg.group.iter() {
        println!("  - {name}");
        if !group.description.is_empty() {
            println!("      description: {}", group.description);
        }
        println!(
            "      build: {} {:?} (dir {})",
            group.build.command, group.build.args, group.build.dir
        );
        println!(
            "      run: {} {:?} (dir {})",
            group.run.command, group.run.args, group.run.dir
        );
        println!("      watch: {:?}", group.watch);
        println!("      heartbeat: {}", group.heartbeat);
    }

    if let Some(proxy) = &cfg.proxy {
        println!();
        println!("reverse proxy on {}:", proxy.bind);
        for (prefix, route) in proxy.route.iter() {
            println!("  {prefix} -> {}", route.host);
        }
    }

    if let Some(statics) = &cfg.static_server {
        println!();
        println!("static server on {} serving {}", statics.bind, statics.dir);
    }

    debug!("dry-run complete (no execution)");
}
