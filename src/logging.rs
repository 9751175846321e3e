//! Logging setup and event macros.
//!
//! Compact timestamps, per-module levels from `[logging]`, and `RUST_LOG`
//! as an override.
//!
//! ```toml
//! [logging]
//! default = "warn"
//!
//! [logging.modules]
//! autoload = "debug"
//! ```
//!
//! ```bash
//! RUST_LOG=debug autoreloader watch lib
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// `HH:MM:SS.mmm` in local time.
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Install the global subscriber. Only the first call has any effect.
///
/// `RUST_LOG`, when set, replaces the configured filter entirely.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directives(config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Filter string for `config`.
///
/// Bare module names (`autoload`) are scoped to this crate so they match
/// the `autoreloader::autoload` target; anything containing `::` is used as is.
pub fn filter_directives(config: &LoggingConfig) -> String {
    let crate_name = env!("CARGO_CRATE_NAME");
    let mut directives = config.default.clone();
    for (module, level) in &config.modules {
        if module.contains("::") || module == crate_name {
            directives.push_str(&format!(",{module}={level}"));
        } else {
            directives.push_str(&format!(",{crate_name}::{module}={level}"));
        }
    }
    directives
}

/// Initialize with `LoggingConfig::default()` (warnings and errors only).
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

/// Info-level event tagged with the component that raised it.
///
/// ```ignore
/// log_event!("autoload", "reloaded", "via {} watcher", name);
/// log_event!("autoload", "initialized");
/// ```
#[macro_export]
macro_rules! log_event {
    ($handler:expr, $event:expr) => {
        tracing::info!("[{}] {}", $handler, $event)
    };
    ($handler:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $handler, $event, format!($($arg)*))
    };
}

/// Same as `log_event!` at debug level.
#[macro_export]
macro_rules! debug_event {
    ($handler:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $handler, $event)
    };
    ($handler:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $handler, $event, format!($($arg)*))
    };
}
