//! List command: load once and report ownership.

use crate::autoload::Autoloader;

pub fn run(autoloader: &Autoloader, json: bool) -> anyhow::Result<()> {
    autoloader.start()?;
    let records = autoloader.load_records();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for record in &records {
        println!("{}", record.path.display());
        for entity in &record.entities {
            println!("  {entity}");
        }
    }
    println!(
        "{} entities from {} files",
        autoloader.all_autoloaded_entities().len(),
        records.len()
    );
    Ok(())
}
