// src/config/loader.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::model::{
    ConfigFile, GroupConfig, ProcessConfig, ProxyConfig, RouteConfig,
};
use crate::config::validate::validate_config;

/// Load a configuration file from a given path and return the raw `ConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (group sanity, route URLs, etc.). Use [`load_and_validate`] for
/// that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML config from {:?}", path))?;

    Ok(config)
}

/// Load a configuration file from path and run semantic validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks group, heartbeat, bind-address, and route-URL sanity.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Serialize a config back to a TOML file. Used by `--init-config`.
pub fn save_to_path(config: &ConfigFile, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let contents =
        toml::to_string_pretty(config).context("serializing config to TOML")?;
    fs::write(path, contents)
        .with_context(|| format!("writing config file at {:?}", path))?;
    Ok(())
}

/// A config with reasonable defaults: one sample build group and a catch-all
/// proxy route pointing at it.
pub fn default_config() -> ConfigFile {
    let mut group = BTreeMap::new();
    group.insert(
        "webserver".to_string(),
        GroupConfig {
            description: "sample webserver build".to_string(),
            watch: vec!["src/**/*.rs".to_string()],
            heartbeat: "1s".to_string(),
            build: ProcessConfig {
                command: "cargo".to_string(),
                args: vec!["build".to_string()],
                dir: ".".to_string(),
                env: BTreeMap::new(),
            },
            run: ProcessConfig {
                command: "./target/debug/webserver".to_string(),
                args: vec![],
                dir: ".".to_string(),
                env: BTreeMap::new(),
            },
        },
    );

    let mut route = BTreeMap::new();
    route.insert(
        "/".to_string(),
        RouteConfig {
            host: "http://localhost:8081".to_string(),
            headers: BTreeMap::new(),
            insecure_skip_verify: false,
        },
    );

    ConfigFile {
        name: "watchrun".to_string(),
        description: "sample watchrun config".to_string(),
        tls_cert_file: None,
        tls_key_file: None,
        group,
        proxy: Some(ProxyConfig {
            bind: "127.0.0.1:8080".to_string(),
            route,
        }),
        static_server: None,
    }
}
