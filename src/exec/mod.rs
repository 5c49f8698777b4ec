// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`process`] is the single execution capability shared by the build and
//!   run steps: it turns a [`crate::config::ProcessConfig`] into a child
//!   process with inherited stdio.
//! - [`runner`] owns the per-group build → run → wait loop.

pub mod process;
pub mod runner;

pub use process::ProcessOutcome;
pub use runner::Runner;
