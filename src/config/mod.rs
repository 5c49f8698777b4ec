// src/config/mod.rs

//! Configuration handling for watchrun.
//!
//! - [`model`] contains the serde structs mapping the TOML config file.
//! - [`loader`] reads/writes config files and produces the default config.
//! - [`validate`] performs semantic validation after deserialization.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config, load_and_validate, load_from_path, save_to_path};
pub use model::{
    parse_duration, ConfigFile, GroupConfig, ProcessConfig, ProxyConfig, RouteConfig,
    StaticServerConfig,
};
pub use validate::validate_config;
