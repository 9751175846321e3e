pub mod logging;

pub mod autoload;
pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod registry;
pub mod runtime;
pub mod types;
pub mod watcher;

pub use autoload::{Autoloader, Phase};
pub use config::{AutoloadConfig, ReloadMode, Settings, WatcherKind};
pub use error::{AutoloadError, AutoloadResult, LoadError, NameError};
pub use host::{DependencyCache, Host, Namespace, SourceExecutor};
pub use registry::{EntityRegistry, Removal, RemovalStats, normalize_name};
pub use types::{EntityId, EntityRef, LoadRecord, QualifiedName, Snapshot};
pub use watcher::{FileWatcher, WatchError, WatcherFactory};
