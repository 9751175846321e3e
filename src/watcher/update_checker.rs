//! Polling watcher based on content fingerprints.
//!
//! Nothing runs in the background: every `check_and_fire` re-hashes the
//! watched files and compares against the fingerprints taken at the last
//! successful reload. Content hashes rather than mtimes, so a rewrite within
//! the filesystem's timestamp granularity is still seen.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::{FileWatcher, ReloadCallback, WatchError, WatchOptions, WatcherFactory};
use crate::error::AutoloadResult;

type Fingerprint = Option<[u8; 32]>;

/// Hash of the file's contents, `None` when it cannot be read.
fn fingerprint(path: &Path) -> Fingerprint {
    std::fs::read(path)
        .ok()
        .map(|bytes| Sha256::digest(&bytes).into())
}

pub struct UpdateChecker {
    paths: Vec<PathBuf>,
    fingerprints: Vec<Fingerprint>,
    on_change: ReloadCallback,
}

impl UpdateChecker {
    pub fn new(paths: Vec<PathBuf>, on_change: ReloadCallback) -> Self {
        let fingerprints = paths.iter().map(|p| fingerprint(p)).collect();
        Self {
            paths,
            fingerprints,
            on_change,
        }
    }

    fn current(&self) -> Vec<Fingerprint> {
        self.paths.iter().map(|p| fingerprint(p)).collect()
    }

    /// Whether any watched file differs from the last recorded state.
    pub fn updated(&self) -> bool {
        self.current() != self.fingerprints
    }
}

impl FileWatcher for UpdateChecker {
    fn name(&self) -> &str {
        "poll"
    }

    fn watched_paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn check_and_fire(&mut self) -> AutoloadResult<bool> {
        let current = self.current();
        if current == self.fingerprints {
            return Ok(false);
        }

        let changed = self
            .paths
            .iter()
            .zip(current.iter().zip(&self.fingerprints))
            .filter(|(_, (now, before))| now != before)
            .count();
        crate::log_event!("poll", "changed", "{changed} file(s)");

        // Fingerprints only advance once the reload went through, so a
        // failed reload is retried on the next check.
        (self.on_change)()?;
        self.fingerprints = current;
        Ok(true)
    }
}

pub struct UpdateCheckerFactory;

impl WatcherFactory for UpdateCheckerFactory {
    fn create(
        &self,
        paths: Vec<PathBuf>,
        _options: WatchOptions,
        on_change: ReloadCallback,
    ) -> Result<Box<dyn FileWatcher>, WatchError> {
        Ok(Box::new(UpdateChecker::new(paths, on_change)))
    }
}
