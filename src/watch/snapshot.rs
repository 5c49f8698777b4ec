// src/watch/snapshot.rs

use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use tracing::{debug, warn};

/// Metadata for one watched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// The files matched by a group's glob patterns at one point in time.
///
/// Entries are kept in glob-enumeration order (pattern order, then match
/// order within a pattern); they are deliberately not sorted, so the order is
/// stable between two resolutions of an unchanged filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    /// Resolve a fresh snapshot from the given glob patterns.
    ///
    /// Stateless and safe to call concurrently from independent groups.
    /// Failures are contained: an invalid pattern is logged and skipped, as
    /// is any individual path that cannot be read or stat'ed. A pattern
    /// matching zero files contributes nothing.
    pub fn resolve(patterns: &[String]) -> Snapshot {
        let mut entries = Vec::new();

        for pattern in patterns {
            let paths = match glob::glob(pattern) {
                Ok(paths) => paths,
                Err(err) => {
                    warn!(pattern = %pattern, error = %err, "invalid glob pattern; skipping");
                    continue;
                }
            };

            for item in paths {
                let path = match item {
                    Ok(path) => path,
                    Err(err) => {
                        warn!(error = %err, "unreadable glob match; skipping");
                        continue;
                    }
                };

                let modified = match fs::metadata(&path).and_then(|meta| meta.modified()) {
                    Ok(modified) => modified,
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "stat failed; skipping");
                        continue;
                    }
                };

                debug!(path = %path.display(), "glob match");
                entries.push(SnapshotEntry { path, modified });
            }
        }

        Snapshot { entries }
    }

    /// Build a snapshot from pre-computed entries.
    pub fn from_entries(entries: Vec<SnapshotEntry>) -> Snapshot {
        Snapshot { entries }
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the two snapshots differ in length, or any positionally
    /// paired entry differs in path or modification time.
    pub fn differs_from(&self, other: &Snapshot) -> bool {
        self.entries != other.entries
    }
}
