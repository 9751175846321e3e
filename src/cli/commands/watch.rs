//! Watch command: load, then reload on a fixed tick until ctrl-c.

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};

use crate::autoload::Autoloader;

pub async fn run(autoloader: Autoloader, interval_ms: u64) -> anyhow::Result<()> {
    let starter = autoloader.clone();
    tokio::task::spawn_blocking(move || starter.start()).await??;

    eprintln!(
        "Watching {} files (interval: {interval_ms}ms). Press Ctrl-C to stop.",
        autoloader.autoloaded_files().len()
    );
    print_entities(&autoloader);

    let mut ticker = interval(Duration::from_millis(interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let loader = autoloader.clone();
                match tokio::task::spawn_blocking(move || loader.reload()).await? {
                    Ok(0) => {}
                    Ok(_) => print_entities(&autoloader),
                    // Keep watching; the next change gets another chance.
                    Err(e) => tracing::error!("Reload failed: {e}"),
                }
            }
            _ = &mut shutdown => {
                eprintln!("Stopping.");
                break;
            }
        }
    }

    Ok(())
}

fn print_entities(autoloader: &Autoloader) {
    let names: Vec<String> = autoloader
        .all_autoloaded_entities()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("Autoloaded: [{}]", names.join(", "));
}
