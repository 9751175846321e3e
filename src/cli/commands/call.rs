//! Call command: load once and invoke a singleton method.

use anyhow::{Context, bail};

use crate::autoload::Autoloader;
use crate::runtime::ModuleSpace;

/// Split `Receiver::Path.method` at the last dot.
pub fn parse_target(target: &str) -> anyhow::Result<(&str, &str)> {
    match target.rsplit_once('.') {
        Some((receiver, method)) if !receiver.is_empty() && !method.is_empty() => {
            Ok((receiver, method))
        }
        _ => bail!("expected RECEIVER.METHOD, got {target:?}"),
    }
}

pub fn run(autoloader: &Autoloader, space: &ModuleSpace, target: &str) -> anyhow::Result<()> {
    let (receiver, method) = parse_target(target)?;
    autoloader.start()?;

    let result = space
        .call(receiver, method)
        .with_context(|| format!("calling {target}"))?;
    println!("{result}");
    Ok(())
}
