//! Directory for running without a chat platform.
//!
//! Knows no users, so every mentioned id becomes a ghost. Messages go to stdout.

use async_trait::async_trait;

use super::{Directory, DirectoryError, Profile};
use crate::bot::reply::{render_plain_text, Block};

pub struct OfflineDirectory;

#[async_trait]
impl Directory for OfflineDirectory {
    async fn fetch_profile(&self, platform_id: &str) -> Result<Profile, DirectoryError> {
        Err(DirectoryError::NotFound(platform_id.to_string()))
    }

    async fn send_text(&self, _channel: &str, text: &str) -> Result<(), DirectoryError> {
        println!("{text}");
        Ok(())
    }

    async fn send_blocks(&self, _channel: &str, blocks: &[Block]) -> Result<(), DirectoryError> {
        println!("{}", render_plain_text(blocks));
        Ok(())
    }
}
