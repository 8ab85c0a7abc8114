//! HTTP server startup.
//!
//! Provides [`serve`], which wires up the database, the Slack directory and
//! the bot into the REST + events router and runs it until Ctrl-C.

use anyhow::Result;
use std::sync::{Arc, Mutex};

use crate::api::{self, AppState};
use crate::bot::NostalgiaBot;
use crate::config::NostalgiaConfig;
use crate::db;
use crate::directory::{self, Directory};

/// Shared setup: open DB, create the directory, find the bot's own user id.
pub async fn setup_state(config: &NostalgiaConfig) -> Result<AppState> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");
    let db = Arc::new(Mutex::new(conn));

    let directory: Arc<dyn Directory> = Arc::from(directory::create_directory(&config.slack)?);

    let bot_user_id = match &config.slack.bot_user_id {
        Some(id) => Some(id.clone()),
        None => match directory.bot_user_id().await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "could not discover bot user id; bot mentions will not be stripped");
                None
            }
        },
    };
    tracing::info!(bot_user_id = ?bot_user_id, "directory ready");

    let bot = NostalgiaBot::new(db.clone(), directory, bot_user_id);
    Ok(AppState { db, bot })
}

/// Serve the REST API and the Slack events endpoint.
pub async fn serve(config: NostalgiaConfig) -> Result<()> {
    let bind_addr = config.bind_addr();
    tracing::info!(addr = %bind_addr, "starting NostalgiaBot server");

    let state = setup_state(&config).await?;
    let router = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening at http://{bind_addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down server");
        })
        .await?;

    Ok(())
}
