//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Hot-reload unit scripts
#[derive(Parser)]
#[command(
    name = "autoreloader",
    version = env!("CARGO_PKG_VERSION"),
    about = "Load unit scripts and reload them when they change",
    long_about = "Load every unit script under the configured paths, track the modules and \
                  classes each file owns, and swap them out when the files change.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create .autoreloader/settings.toml in the current directory
    Init {
        /// Overwrite an existing settings file
        #[arg(short, long)]
        force: bool,
    },

    /// Load the autoload paths and print what each file owns
    List {
        /// Files or directories to load (overrides autoload.paths)
        paths: Vec<PathBuf>,

        /// Print load records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load the autoload paths and call a singleton method
    #[command(after_help = "Example:\n  autoreloader call TestModule.hello lib")]
    Call {
        /// Method to call, as RECEIVER.METHOD
        target: String,

        /// Files or directories to load (overrides autoload.paths)
        paths: Vec<PathBuf>,
    },

    /// Load the autoload paths and keep reloading them until interrupted
    Watch {
        /// Files or directories to load (overrides autoload.paths)
        paths: Vec<PathBuf>,

        /// How often to check for changes
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,

        /// Reload on every tick instead of only when files change
        #[arg(long)]
        eager: bool,
    },
}
