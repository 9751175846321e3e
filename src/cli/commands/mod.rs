//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod call;
pub mod init;
pub mod list;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use crate::autoload::Autoloader;
use crate::config::AutoloadConfig;
use crate::runtime::{self, ModuleSpace};

/// Autoload config for a CLI run: positional paths replace the configured
/// ones and reloading is always on.
pub fn effective_config(mut config: AutoloadConfig, paths: Vec<PathBuf>) -> AutoloadConfig {
    if !paths.is_empty() {
        config.paths = paths;
    }
    config.enabled = true;
    config
}

/// Autoloader over a fresh bundled runtime.
pub fn build_autoloader(config: AutoloadConfig) -> (Autoloader, Arc<ModuleSpace>) {
    let (host, space) = runtime::host(&config.extension);
    (Autoloader::new(config, host), space)
}
