use std::path::PathBuf;

use indexmap::IndexSet;

use crate::types::{LoadRecord, QualifiedName, Snapshot};

/// Lifecycle of an autoloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Uninitialized,
    Initialized,
    Loaded,
    Cleared,
}

/// Everything one load cycle accumulates. Reset by `clear`.
#[derive(Debug, Default)]
pub struct AutoloadState {
    /// Namespace as it was right before the most recent file load.
    pub snapshot_before_load: Snapshot,
    /// Owned entities, in discovery order.
    pub autoloaded_entities: IndexSet<QualifiedName>,
    /// Files loaded successfully this cycle, in load order.
    pub autoloaded_files: Vec<PathBuf>,
    pub records: Vec<LoadRecord>,
    pub phase: Phase,
}

impl AutoloadState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop per-cycle bookkeeping. Entities are drained by the registry, not here.
    pub fn reset_cycle(&mut self) {
        self.snapshot_before_load.clear();
        self.autoloaded_files.clear();
        self.records.clear();
    }
}
