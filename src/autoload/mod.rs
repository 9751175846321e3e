//! The autoload orchestrator.
//!
//! Drives the load / clear / reload lifecycle over a `Host`:
//!
//! ```text
//! start ──> init ──> load_paths ──> register_watcher
//!                        │
//!   for each file:  snapshot ─ execute ─ snapshot ─ diff ─ match
//!
//! reload ──> watch mode: every watcher's check_and_fire
//!        └─> eager:      clear + load_paths
//! ```
//!
//! One `Autoloader` owns all process state. Clones share it.

mod discover;
mod state;

pub use discover::expand_roots;
pub use state::{AutoloadState, Phase};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{AutoloadConfig, ReloadMode};
use crate::error::AutoloadResult;
use crate::host::Host;
use crate::registry::{EntityRegistry, RemovalStats};
use crate::types::{LoadRecord, QualifiedName};
use crate::watcher::{FileWatcher, ReloadCallback, WatchOptions, WatcherFactory};

/// Runs clear and load cycles. Shared with watcher callbacks.
struct CycleRunner {
    host: Host,
    registry: EntityRegistry,
    roots: Vec<PathBuf>,
    extension: String,
    state: Mutex<AutoloadState>,
}

impl CycleRunner {
    fn load_paths(&self, state: &mut AutoloadState) -> AutoloadResult<()> {
        for file in expand_roots(&self.roots, &self.extension)? {
            self.load_file(state, &file)?;
        }
        state.phase = Phase::Loaded;

        let names: Vec<String> = state
            .autoloaded_entities
            .iter()
            .map(ToString::to_string)
            .collect();
        crate::log_event!("autoload", "autoloaded", "[{}]", names.join(", "));
        Ok(())
    }

    fn load_file(&self, state: &mut AutoloadState, path: &Path) -> AutoloadResult<()> {
        state.snapshot_before_load = self.host.namespace.snapshot();
        self.host.executor.execute(path)?;
        let after = self.host.namespace.snapshot();

        let created = EntityRegistry::diff(&state.snapshot_before_load, &after);
        let owned = EntityRegistry::match_by_file_convention(&created, path);
        crate::debug_event!(
            "autoload",
            "loaded",
            "{} ({} new, {} owned)",
            path.display(),
            created.len(),
            owned.len()
        );

        for name in &owned {
            state.autoloaded_entities.insert(name.clone());
        }
        state.autoloaded_files.push(path.to_path_buf());
        state.records.push(LoadRecord {
            path: path.to_path_buf(),
            entities: owned,
        });
        Ok(())
    }

    fn clear(&self, state: &mut AutoloadState) -> AutoloadResult<RemovalStats> {
        let stats = self.registry.remove_all(&mut state.autoloaded_entities)?;
        state.reset_cycle();
        state.phase = Phase::Cleared;
        self.host.cache.invalidate();

        crate::log_event!(
            "autoload",
            "cleared",
            "{} detached, {} already gone",
            stats.detached,
            stats.skipped
        );
        Ok(stats)
    }

    /// Clear + load with the state lock held throughout.
    fn run_cycle(&self) -> AutoloadResult<()> {
        let mut state = self.state.lock();
        self.clear(&mut state)?;
        self.load_paths(&mut state)
    }
}

struct Shared {
    config: AutoloadConfig,
    runner: Arc<CycleRunner>,
    watchers: Mutex<Vec<Box<dyn FileWatcher>>>,
    factory: Box<dyn WatcherFactory>,
}

/// Hot-reload engine over a set of autoload roots.
#[derive(Clone)]
pub struct Autoloader {
    shared: Arc<Shared>,
}

impl Autoloader {
    /// Build an autoloader using the watcher kind named in `config`.
    pub fn new(config: AutoloadConfig, host: Host) -> Self {
        let factory = config.watcher.factory();
        Self::with_watcher_factory(config, host, factory)
    }

    pub fn with_watcher_factory(
        config: AutoloadConfig,
        host: Host,
        factory: Box<dyn WatcherFactory>,
    ) -> Self {
        let registry = EntityRegistry::new(host.namespace.clone());
        let runner = CycleRunner {
            host,
            registry,
            roots: config.paths.clone(),
            extension: config.extension.clone(),
            state: Mutex::new(AutoloadState::new()),
        };

        Self {
            shared: Arc::new(Shared {
                config,
                runner: Arc::new(runner),
                watchers: Mutex::new(Vec::new()),
                factory,
            }),
        }
    }

    /// Reset all per-cycle state. Registered watchers are kept.
    pub fn init(&self) {
        *self.shared.runner.state.lock() = AutoloadState {
            phase: Phase::Initialized,
            ..AutoloadState::new()
        };
        crate::debug_event!("autoload", "initialized");
    }

    /// Load every file under the configured roots, recording what each defines.
    ///
    /// A load error stops the pass; files loaded before it stay tracked.
    pub fn load_paths(&self) -> AutoloadResult<()> {
        let mut state = self.shared.runner.state.lock();
        self.shared.runner.load_paths(&mut state)
    }

    /// Remove every autoloaded entity and forget the loaded files.
    pub fn clear(&self) -> AutoloadResult<RemovalStats> {
        let mut state = self.shared.runner.state.lock();
        self.shared.runner.clear(&mut state)
    }

    /// Reload according to the configured mode.
    ///
    /// Returns the number of reload cycles that ran: watchers fired in
    /// watch mode, one in eager mode, zero when reloading is disabled.
    pub fn reload(&self) -> AutoloadResult<usize> {
        if !self.is_enabled() {
            return Ok(0);
        }

        match self.shared.config.reload_mode() {
            ReloadMode::WatchTriggered => {
                let mut watchers = self.shared.watchers.lock();
                let mut fired = 0;
                for watcher in watchers.iter_mut() {
                    if watcher.check_and_fire()? {
                        crate::log_event!("autoload", "reloaded", "via {} watcher", watcher.name());
                        fired += 1;
                    }
                }
                Ok(fired)
            }
            ReloadMode::Eager => {
                self.shared.runner.run_cycle()?;
                crate::log_event!("autoload", "reloaded", "eager");
                Ok(1)
            }
        }
    }

    /// Watch the files loaded so far. Returns whether a watcher was added.
    pub fn register_watcher(&self) -> AutoloadResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let files = self.autoloaded_files();
        let runner = Arc::clone(&self.shared.runner);
        let callback: ReloadCallback = Box::new(move || runner.run_cycle());
        let options = WatchOptions {
            debounce_ms: self.shared.config.debounce_ms,
        };

        let watcher = self.shared.factory.create(files, options, callback)?;
        crate::log_event!(
            "autoload",
            "watching",
            "{} files with {} watcher",
            watcher.watched_paths().len(),
            watcher.name()
        );
        self.shared.watchers.lock().push(watcher);
        Ok(true)
    }

    /// `init`, `load_paths`, then `register_watcher`.
    pub fn start(&self) -> AutoloadResult<()> {
        self.init();
        self.load_paths()?;
        self.register_watcher()?;
        Ok(())
    }

    /// Owned entities in discovery order.
    pub fn all_autoloaded_entities(&self) -> Vec<QualifiedName> {
        self.shared
            .runner
            .state
            .lock()
            .autoloaded_entities
            .iter()
            .cloned()
            .collect()
    }

    pub fn autoloaded_files(&self) -> Vec<PathBuf> {
        self.shared.runner.state.lock().autoloaded_files.clone()
    }

    /// Per-file ownership for the current cycle.
    pub fn load_records(&self) -> Vec<LoadRecord> {
        self.shared.runner.state.lock().records.clone()
    }

    pub fn phase(&self) -> Phase {
        self.shared.runner.state.lock().phase
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.config.enabled
    }

    pub fn settings(&self) -> &AutoloadConfig {
        &self.shared.config
    }

    pub fn watcher_count(&self) -> usize {
        self.shared.watchers.lock().len()
    }
}
