use anyhow::Result;

use nostalgia::archive::export_entries;
use nostalgia::config::NostalgiaConfig;

/// Print the whole archive as JSON to stdout, in the format `import` reads.
pub fn export(config: &NostalgiaConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = nostalgia::db::open_database(&db_path)?;

    let entries = export_entries(&conn)?;
    let json = serde_json::to_string_pretty(&entries)?;
    println!("{json}");

    tracing::info!(people = entries.len(), "export complete");
    Ok(())
}
