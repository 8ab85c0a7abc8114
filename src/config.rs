use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NostalgiaConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub slack: SlackConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SlackConfig {
    /// Bot OAuth token (xoxb-...).
    pub bot_token: String,
    /// The bot's own user id. Discovered with `auth.test` when unset.
    pub bot_user_id: Option<String>,
    /// Base URL of the Web API. Only overridden in tests.
    pub api_base: String,
}

impl Default for NostalgiaConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            slack: SlackConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_nostalgia_dir()
            .join("nostalgia.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            bot_user_id: None,
            api_base: "https://slack.com/api".into(),
        }
    }
}

/// Returns `~/.nostalgia/`
pub fn default_nostalgia_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".nostalgia")
}

/// Returns the default config file path: `~/.nostalgia/config.toml`
pub fn default_config_path() -> PathBuf {
    default_nostalgia_dir().join("config.toml")
}

impl NostalgiaConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            NostalgiaConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("NOSTALGIA_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("NOSTALGIA_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("NOSTALGIA_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid NOSTALGIA_PORT"),
            }
        }
        if let Ok(val) = std::env::var("NOSTALGIA_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("SLACK_BOT_TOKEN") {
            self.slack.bot_token = val;
        }
        if let Ok(val) = std::env::var("SLACK_BOT_USER_ID") {
            self.slack.bot_user_id = Some(val);
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
