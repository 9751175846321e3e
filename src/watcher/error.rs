//! Error types for reload watchers.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },
}

impl From<notify::Error> for WatchError {
    /// Attributes the error to the first path `notify` reports, if any.
    fn from(e: notify::Error) -> Self {
        let reason = e.to_string();
        match e.paths.into_iter().next() {
            Some(path) => WatchError::PathWatchFailed { path, reason },
            None => WatchError::InitFailed { reason },
        }
    }
}
