// src/watch/mod.rs

//! Change detection for build groups.
//!
//! watchrun does not use native filesystem notification; each group's
//! [`Watcher`] polls the filesystem on its configured heartbeat interval,
//! resolving the group's glob patterns into a [`Snapshot`] and signalling the
//! runner when two consecutive snapshots differ.

pub mod snapshot;
pub mod watcher;

pub use snapshot::{Snapshot, SnapshotEntry};
pub use watcher::Watcher;
