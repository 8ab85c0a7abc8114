use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use nostalgia::archive::{import_entries, ArchiveEntry};
use nostalgia::config::NostalgiaConfig;

/// Import people and quotes from a JSON file in the export format.
///
/// People already in the archive are reused; quotes they already have are skipped.
pub fn import(config: &NostalgiaConfig, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;

    let entries: Vec<ArchiveEntry> =
        serde_json::from_str(&json).context("failed to parse import JSON")?;

    let db_path = config.resolved_db_path();
    let mut conn = nostalgia::db::open_database(&db_path)?;

    let total_quotes: usize = entries.iter().map(|e| e.quotes.len()).sum();
    println!(
        "Importing {} people and {} quotes...",
        entries.len(),
        total_quotes
    );

    let pb = ProgressBar::new(entries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta})")
            .context("invalid progress template")?
            .progress_chars("##-"),
    );

    let summary = import_entries(&mut conn, &entries, || pb.inc(1))?;
    pb.finish_and_clear();

    println!("Import complete:");
    println!("  People created: {}", summary.people_created);
    println!("  People reused:  {}", summary.people_reused);
    println!("  Quotes imported: {}", summary.quotes_imported);
    println!("  Quotes skipped:  {} (already exist)", summary.quotes_skipped);
    for failure in &summary.failures {
        eprintln!("Warning: {failure}");
    }

    Ok(())
}
