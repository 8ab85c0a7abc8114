use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};

use nostalgia::bot::NostalgiaBot;
use nostalgia::config::NostalgiaConfig;
use nostalgia::directory::offline::OfflineDirectory;

/// Run one chat command against the local archive and print the reply.
///
/// Uses the offline directory, so mentioned users nobody knows yet are stored
/// as ghosts.
pub async fn ask(config: &NostalgiaConfig, sender: &str, text: &str) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = nostalgia::db::open_database(&db_path)?;
    let db = Arc::new(Mutex::new(conn));

    let bot = NostalgiaBot::new(db, Arc::new(OfflineDirectory), None);
    let result = bot
        .handle(sender, text)
        .await
        .context("failed to handle command")?;

    println!("{}", result.message());
    if !result.ok {
        eprintln!("Try `nostalgia ask help` for the list of commands.");
    }
    Ok(())
}
