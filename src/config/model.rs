// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// name = "my-project"
///
/// [group.webserver]
/// watch = ["src/**/*.rs"]
/// heartbeat = "1s"
///
/// [group.webserver.build]
/// command = "cargo"
/// args = ["build"]
///
/// [group.webserver.run]
/// command = "./target/debug/webserver"
///
/// [proxy]
/// bind = "127.0.0.1:8080"
///
/// [proxy.route."/"]
/// host = "http://localhost:8081"
/// ```
///
/// The `[proxy]` and `[static_server]` sections are optional; leaving one out
/// disables that server. The config is loaded once at startup and is
/// read-only afterwards; editing the file on disk has no runtime effect.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConfigFile {
    /// Project name, used in logs only.
    #[serde(default)]
    pub name: String,

    /// Free-form description.
    #[serde(default)]
    pub description: String,

    /// Path to a TLS certificate file, shared by the proxy and static server.
    ///
    /// TLS is only enabled when both `tls_cert_file` and `tls_key_file` are
    /// set; a half-set pair logs a warning and serves plaintext.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_cert_file: Option<String>,

    /// Path to the matching TLS private key file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_key_file: Option<String>,

    /// All build groups from `[group.<name>]`.
    ///
    /// Keys are the group names (e.g. `"webserver"`).
    #[serde(default)]
    pub group: BTreeMap<String, GroupConfig>,

    /// Reverse proxy settings from `[proxy]`, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,

    /// Static file server settings from `[static_server]`, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_server: Option<StaticServerConfig>,
}

/// `[group.<name>]` section: one independently supervised build group.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroupConfig {
    /// Free-form description.
    #[serde(default)]
    pub description: String,

    /// Glob patterns to watch for changes, evaluated relative to the
    /// supervisor's working directory.
    pub watch: Vec<String>,

    /// Polling interval for the watcher, e.g. `"1s"` or `"500ms"`.
    #[serde(default = "default_heartbeat")]
    pub heartbeat: String,

    /// How to build the artifact.
    pub build: ProcessConfig,

    /// How to run the built artifact.
    pub run: ProcessConfig,
}

fn default_heartbeat() -> String {
    "1s".to_string()
}

impl GroupConfig {
    /// Parsed heartbeat interval.
    pub fn heartbeat_duration(&self) -> Result<Duration, String> {
        parse_duration(&self.heartbeat)
    }
}

/// One process invocation: shared shape for the build and run steps.
///
/// The child process inherits the supervisor's stdout/stderr and its
/// environment; `env` entries are applied on top of the inherited
/// environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessConfig {
    /// Executable to invoke (no shell interpretation).
    pub command: String,

    /// Arguments passed to the command.
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory for the command.
    #[serde(default = "default_dir")]
    pub dir: String,

    /// Environment variable overrides.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_dir() -> String {
    ".".to_string()
}

/// `[proxy]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Address to bind, e.g. `"127.0.0.1:8080"`.
    pub bind: String,

    /// Routes from `[proxy.route."<prefix>"]`, keyed by path prefix.
    ///
    /// A prefix ending in `/` matches the whole subtree under it; the
    /// longest matching prefix wins.
    #[serde(default)]
    pub route: BTreeMap<String, RouteConfig>,
}

/// One reverse proxy target.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Upstream URL, e.g. `"http://localhost:8081"`.
    pub host: String,

    /// Disable TLS certificate verification towards the upstream.
    #[serde(default)]
    pub insecure_skip_verify: bool,

    /// Headers added to every forwarded request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// `[static_server]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticServerConfig {
    /// Address to bind, e.g. `"127.0.0.1:8090"`.
    pub bind: String,

    /// Directory to serve files from.
    pub dir: String,
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
