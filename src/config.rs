//! Configuration module for the autoreloader.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `AR_` and use double underscores
//! to separate nested levels:
//! - `AR_AUTOLOAD__ENABLED=true` sets `autoload.enabled`
//! - `AR_AUTOLOAD__RELOAD_ONLY_ON_CHANGE=false` sets `autoload.reload_only_on_change`
//! - `AR_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::watcher::{NotifyWatcherFactory, UpdateCheckerFactory, WatcherFactory};

/// Directory holding the settings file, searched upward from the working directory.
pub const CONFIG_DIR: &str = ".autoreloader";

const ENV_PREFIX: &str = "AR_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Autoload and reload behaviour
    #[serde(default)]
    pub autoload: AutoloadConfig,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AutoloadConfig {
    /// Files or directories to autoload. Directories are expanded recursively.
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Whether reloading is enabled at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Reload only when a watcher reports a change (`false` reloads eagerly)
    #[serde(default = "default_true")]
    pub reload_only_on_change: bool,

    /// Which watcher implementation backs change detection
    #[serde(default)]
    pub watcher: WatcherKind,

    /// Debounce window for filesystem events, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Source file extension, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for every target
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `autoload = "debug"`
    #[serde(default)]
    pub modules: IndexMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WatcherKind {
    /// Compare content fingerprints whenever `reload()` runs
    #[default]
    Poll,
    /// Filesystem notifications, debounced
    Notify,
}

/// How `reload()` decides whether to run a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadMode {
    /// Ask every watcher; only watchers that saw a change fire.
    WatchTriggered,
    /// Clear and load unconditionally.
    Eager,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_debounce_ms() -> u64 {
    200
}
fn default_extension() -> String {
    crate::runtime::DEFAULT_EXTENSION.to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}
/// Variables naming the deployment environment, in lookup order.
const ENVIRONMENT_VARS: [&str; 2] = ["APP_ENV", "RACK_ENV"];

fn default_enabled() -> bool {
    is_development(|key| std::env::var(key).ok())
}

/// Whether the first environment variable that is set says `development`.
fn is_development(lookup: impl Fn(&str) -> Option<String>) -> bool {
    ENVIRONMENT_VARS
        .iter()
        .find_map(|key| lookup(*key))
        .is_some_and(|env| env == "development")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            autoload: AutoloadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for AutoloadConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            enabled: default_enabled(),
            reload_only_on_change: true,
            watcher: WatcherKind::default(),
            debounce_ms: default_debounce_ms(),
            extension: default_extension(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: IndexMap::new(),
        }
    }
}

impl AutoloadConfig {
    pub fn reload_mode(&self) -> ReloadMode {
        if self.reload_only_on_change {
            ReloadMode::WatchTriggered
        } else {
            ReloadMode::Eager
        }
    }
}

impl WatcherKind {
    /// Factory producing watchers of this kind.
    pub fn factory(self) -> Box<dyn WatcherFactory> {
        match self {
            WatcherKind::Poll => Box::new(UpdateCheckerFactory),
            WatcherKind::Notify => Box::new(NotifyWatcherFactory),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still layering env on top
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels, single underscore stays
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by looking for the config directory
    /// from the current directory up to the filesystem root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file under `root`
    pub fn init_config_file(root: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}
