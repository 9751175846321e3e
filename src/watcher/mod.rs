//! Change detection for autoloaded files.
//!
//! A watcher is created over a snapshot of the files loaded in a cycle and
//! bound to a reload callback. `check_and_fire` asks it whether anything
//! changed since the last check and, if so, runs the callback.
//!
//! # Architecture
//!
//! ```text
//! Autoloader::register_watcher
//!   - WatcherFactory::create(files, options, callback)
//!         |
//!    +-----------------+------------------+
//!    |                                    |
//! UpdateChecker                      NotifyWatcher
//!   - sha256 fingerprints              - notify::RecommendedWatcher
//!   - compared on every check          - PathRegistry (watch dirs)
//!                                      - Debouncer
//! ```

mod debouncer;
mod error;
mod handle;
mod notify_watcher;
mod path_registry;
mod update_checker;

pub use debouncer::Debouncer;
pub use error::WatchError;
pub use handle::{FileWatcher, ReloadCallback, WatchOptions, WatcherFactory};
pub use notify_watcher::{NotifyWatcher, NotifyWatcherFactory};
pub use path_registry::PathRegistry;
pub use update_checker::{UpdateChecker, UpdateCheckerFactory};
