// src/serve/static_files.rs

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::StaticServerConfig;
use crate::serve::TlsFiles;

/// Serve static files from the configured directory until `token` is
/// cancelled.
pub async fn run_static(
    cfg: StaticServerConfig,
    tls: Option<TlsFiles>,
    token: CancellationToken,
) -> Result<()> {
    let addr: SocketAddr = cfg
        .bind
        .parse()
        .with_context(|| format!("invalid static server bind address '{}'", cfg.bind))?;

    let dir = PathBuf::from(&cfg.dir);
    if !dir.is_dir() {
        return Err(anyhow!(
            "static server directory '{}' does not exist",
            dir.display()
        ));
    }

    let routes = warp::fs::dir(dir.clone());
    let shutdown = async move { token.cancelled().await };

    match tls {
        Some(tls) => {
            info!(addr = %addr, dir = %dir.display(), "static server listening (tls)");
            let (_, server) = warp::serve(routes)
                .tls()
                .cert_path(&tls.cert)
                .key_path(&tls.key)
                .bind_with_graceful_shutdown(addr, shutdown);
            server.await;
        }
        None => {
            info!(addr = %addr, dir = %dir.display(), "static server listening");
            let (_, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, shutdown);
            server.await;
        }
    }

    info!("static server shutdown");
    Ok(())
}
