//! Init command.

use std::path::Path;

use anyhow::anyhow;

use crate::config::Settings;

/// Create `.autoreloader/settings.toml` under `root`.
pub fn run(root: &Path, force: bool) -> anyhow::Result<()> {
    let path = Settings::init_config_file(root, force).map_err(|e| anyhow!("{e}"))?;
    println!("Created configuration file at: {}", path.display());
    println!("Edit this file to customize your settings.");
    Ok(())
}
