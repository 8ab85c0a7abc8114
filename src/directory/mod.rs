//! Chat-platform directory: user profile lookups and outbound messages.
//!
//! Provides the [`Directory`] trait, a Slack Web API implementation and an
//! offline stand-in for local use. The adapter is picked via
//! [`create_directory`] from configuration.

pub mod offline;
pub mod slack;

use async_trait::async_trait;
use thiserror::Error;

use crate::bot::reply::Block;
use crate::config::SlackConfig;

/// Errors raised by a [`Directory`].
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// The platform does not know this user id.
    #[error("User {0} not found")]
    NotFound(String),

    /// The platform answered with an error.
    #[error("Slack API error: {0}")]
    Api(String),

    /// Transport failure.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },
}

impl From<reqwest::Error> for DirectoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DirectoryError::Api(err.to_string())
        } else {
            DirectoryError::Network(err.to_string())
        }
    }
}

/// Name fields of a platform user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub first_name: String,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
}

impl Profile {
    /// Split a full name at the first whitespace into first and last name.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        let (first, last) = match name.split_once(char::is_whitespace) {
            Some((first, last)) => (first, Some(last.trim().to_string())),
            None => (name, None),
        };
        Self {
            first_name: first.to_string(),
            last_name: last.filter(|l| !l.is_empty()),
            display_name: None,
        }
    }
}

/// Everything the bot needs from the chat platform.
///
/// Implementations must be cheap to share across tasks.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up a user's profile by platform id.
    ///
    /// Returns [`DirectoryError::NotFound`] for ids the platform does not know.
    async fn fetch_profile(&self, platform_id: &str) -> Result<Profile, DirectoryError>;

    /// Post plain text to a channel.
    async fn send_text(&self, channel: &str, text: &str) -> Result<(), DirectoryError>;

    /// Post structured blocks to a channel.
    async fn send_blocks(&self, channel: &str, blocks: &[Block]) -> Result<(), DirectoryError>;

    /// The bot's own user id on the platform, if it has one.
    async fn bot_user_id(&self) -> Result<Option<String>, DirectoryError> {
        Ok(None)
    }
}

/// Build the directory for this config: Slack when a bot token is set,
/// offline otherwise.
pub fn create_directory(config: &SlackConfig) -> anyhow::Result<Box<dyn Directory>> {
    if config.bot_token.trim().is_empty() {
        tracing::warn!("no Slack bot token configured; using offline directory");
        return Ok(Box::new(offline::OfflineDirectory));
    }
    let directory = slack::SlackDirectory::new(config)?;
    Ok(Box::new(directory))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_from_full_name() {
        let profile = Profile::from_name("Jamie Lee");
        assert_eq!(profile.first_name, "Jamie");
        assert_eq!(profile.last_name.as_deref(), Some("Lee"));

        let profile = Profile::from_name("Mary Jane Watson");
        assert_eq!(profile.first_name, "Mary");
        assert_eq!(profile.last_name.as_deref(), Some("Jane Watson"));
    }

    #[test]
    fn profile_from_single_name() {
        let profile = Profile::from_name(" Cher ");
        assert_eq!(profile.first_name, "Cher");
        assert!(profile.last_name.is_none());
    }

    #[test]
    fn offline_when_no_token() {
        let config = SlackConfig::default();
        assert!(create_directory(&config).is_ok());
    }
}
