//! Capabilities the autoloader consumes from the host runtime.
//!
//! The autoloader never executes source or walks the namespace itself; it
//! drives these seams. `runtime` ships one implementation of all three.

use std::path::Path;
use std::sync::Arc;

use crate::error::{LoadError, NameError};
use crate::types::Snapshot;

/// Runs a file's top-level definitions into the shared namespace.
pub trait SourceExecutor: Send + Sync {
    fn execute(&self, path: &Path) -> Result<(), LoadError>;
}

/// Live view of the shared namespace.
///
/// Paths are `::`-joined segments; the empty string names the root.
pub trait Namespace: Send + Sync {
    /// Every entity currently defined.
    fn snapshot(&self) -> Snapshot;

    /// Whether `path` resolves. Malformed paths are an error, not `false`.
    fn is_defined(&self, path: &str) -> Result<bool, NameError>;

    /// Whether `parent` directly contains a child called `name`.
    fn has_child(&self, parent: &str, name: &str) -> Result<bool, NameError>;

    /// Detach `name` from `parent`. Returns `false` when there was nothing to detach.
    fn detach(&self, parent: &str, name: &str) -> Result<bool, NameError>;
}

/// Cross-file lookup caches dropped whenever the managed set is cleared.
pub trait DependencyCache: Send + Sync {
    fn invalidate(&self);
}

/// The three host capabilities bundled together.
#[derive(Clone)]
pub struct Host {
    pub executor: Arc<dyn SourceExecutor>,
    pub namespace: Arc<dyn Namespace>,
    pub cache: Arc<dyn DependencyCache>,
}

impl Host {
    pub fn new(
        executor: Arc<dyn SourceExecutor>,
        namespace: Arc<dyn Namespace>,
        cache: Arc<dyn DependencyCache>,
    ) -> Self {
        Self {
            executor,
            namespace,
            cache,
        }
    }
}
