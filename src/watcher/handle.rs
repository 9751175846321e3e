//! Watcher handle and factory traits.

use std::path::PathBuf;

use super::WatchError;
use crate::error::AutoloadResult;

/// Continuation run when a watcher sees a change. Performs a full
/// clear + load cycle.
pub type ReloadCallback = Box<dyn FnMut() -> AutoloadResult<()> + Send>;

/// Options handed to a factory along with the file list.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Debounce window for event-driven watchers.
    pub debounce_ms: u64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self { debounce_ms: 200 }
    }
}

/// A registered watcher.
pub trait FileWatcher: Send {
    /// Watcher name for logging.
    fn name(&self) -> &str;

    /// Files this watcher observes.
    fn watched_paths(&self) -> &[PathBuf];

    /// Run the callback if any watched file changed since the last check.
    ///
    /// Returns whether the callback ran. Callback failures propagate.
    fn check_and_fire(&mut self) -> AutoloadResult<bool>;
}

/// Builds watchers over a file snapshot.
pub trait WatcherFactory: Send + Sync {
    fn create(
        &self,
        paths: Vec<PathBuf>,
        options: WatchOptions,
        on_change: ReloadCallback,
    ) -> Result<Box<dyn FileWatcher>, WatchError>;
}
