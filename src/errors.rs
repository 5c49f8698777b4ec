// src/errors.rs

//! Crate-wide error aliases.
//!
//! A thin wrapper around `anyhow`; gives the crate a single place to grow
//! more structured error types later.

pub use anyhow::{Error, Result};
