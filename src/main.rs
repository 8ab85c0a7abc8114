mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use nostalgia::config::NostalgiaConfig;

#[derive(Parser)]
#[command(name = "nostalgia", version, about = "A chat bot that remembers what people said")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the REST API and the Slack events endpoint
    Serve,
    /// Run one chat command against the local archive and print the reply
    Ask {
        /// User id the command is sent as (used for `remind me`)
        #[arg(long, default_value = "me")]
        sender: String,
        /// The command text, e.g. 'quote jeff'
        text: String,
    },
    /// Import people and quotes from a JSON file
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
    /// Export the archive as JSON to stdout
    Export,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = NostalgiaConfig::load()?;

    // Log to stderr so stdout stays clean for `export`.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            nostalgia::server::serve(config).await?;
        }
        Command::Ask { sender, text } => {
            cli::ask(&config, &sender, &text).await?;
        }
        Command::Import { file } => {
            cli::import(&config, &file)?;
        }
        Command::Export => {
            cli::export(&config)?;
        }
    }

    Ok(())
}
