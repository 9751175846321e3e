use clap::Parser;

use autoreloader::cli::commands::{self, build_autoloader, effective_config};
use autoreloader::cli::{Cli, Commands};
use autoreloader::config::Settings;
use autoreloader::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        eprintln!("Using default configuration.");
        Settings::default()
    });

    logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { force } => {
            let root = std::env::current_dir()?;
            commands::init::run(&root, force)
        }

        Commands::List { paths, json } => {
            let (autoloader, _space) = build_autoloader(effective_config(settings.autoload, paths));
            commands::list::run(&autoloader, json)
        }

        Commands::Call { target, paths } => {
            let (autoloader, space) = build_autoloader(effective_config(settings.autoload, paths));
            commands::call::run(&autoloader, &space, &target)
        }

        Commands::Watch {
            paths,
            interval_ms,
            eager,
        } => {
            let mut config = effective_config(settings.autoload, paths);
            if eager {
                config.reload_only_on_change = false;
            }
            let (autoloader, _space) = build_autoloader(config);
            commands::watch::run(autoloader, interval_ms).await
        }
    }
}
