// src/serve/mod.rs

//! HTTP boundary collaborators: the reverse proxy and the static file
//! server.
//!
//! Both consume their own section of the loaded configuration, run as
//! independent tasks parented only to the root cancellation token, and have
//! no dependency on (or visibility into) the build groups.

pub mod proxy;
pub mod static_files;

use std::path::PathBuf;

use tracing::warn;

use crate::config::ConfigFile;

/// Certificate/key pair for serving TLS.
#[derive(Debug, Clone)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Resolve the TLS file pair from config.
///
/// Both files are required; a half-set pair logs a warning and the servers
/// fall back to plaintext.
pub fn tls_files(cfg: &ConfigFile) -> Option<TlsFiles> {
    match (&cfg.tls_cert_file, &cfg.tls_key_file) {
        (Some(cert), Some(key)) => Some(TlsFiles {
            cert: PathBuf::from(cert),
            key: PathBuf::from(key),
        }),
        (Some(cert), None) => {
            warn!(cert = %cert, "tls_cert_file set but tls_key_file missing; serving plaintext");
            None
        }
        (None, Some(key)) => {
            warn!(key = %key, "tls_key_file set but tls_cert_file missing; serving plaintext");
            None
        }
        (None, None) => None,
    }
}
