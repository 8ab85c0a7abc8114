//! Slack Web API directory.
//!
//! Uses `users.info` for profiles, `chat.postMessage` for replies and
//! `auth.test` to discover the bot's own user id.

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde_json::{json, Value};
use std::time::Duration;

use super::{Directory, DirectoryError, Profile};
use crate::bot::reply::{render_plain_text, Block};
use crate::config::SlackConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SlackDirectory {
    client: Client,
    api_base: String,
    bot_token: String,
}

impl SlackDirectory {
    pub fn new(config: &SlackConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
        })
    }

    async fn post(&self, method: &str, payload: &Value) -> Result<Value, DirectoryError> {
        let url = format!("{}/{}", self.api_base, method);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bot_token)
            .header("Content-Type", "application/json; charset=utf-8")
            .json(payload)
            .send()
            .await?;
        check_response(response).await
    }

    async fn get(&self, method: &str, query: &[(&str, &str)]) -> Result<Value, DirectoryError> {
        let mut url = Url::parse(&format!("{}/{}", self.api_base, method))
            .map_err(|e| DirectoryError::Api(format!("bad api url: {e}")))?;
        url.query_pairs_mut().extend_pairs(query);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.bot_token)
            .send()
            .await?;
        check_response(response).await
    }

    async fn post_message(&self, payload: Value) -> Result<(), DirectoryError> {
        self.post("chat.postMessage", &payload).await?;
        Ok(())
    }
}

/// Turn an HTTP response into the Slack JSON body, mapping failures.
async fn check_response(response: Response) -> Result<Value, DirectoryError> {
    if response.status() == 429 {
        let retry_after_secs = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        return Err(DirectoryError::RateLimited { retry_after_secs });
    }

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(DirectoryError::Api(format!("{status}: {body}")));
    }

    let body: Value = response.json().await?;
    if body.get("ok").and_then(Value::as_bool) == Some(true) {
        Ok(body)
    } else {
        let code = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error");
        Err(DirectoryError::Api(code.to_string()))
    }
}

/// Extract name fields from a `users.info` `user` object.
///
/// Explicit profile first/last names win; otherwise `real_name` is split at
/// the first whitespace. Falls back to the handle when no name is set.
pub fn profile_from_user(user: &Value) -> Profile {
    let field = |obj: Option<&Value>, key: &str| -> Option<String> {
        obj.and_then(|o| o.get(key))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let profile = user.get("profile");

    let mut result = match field(profile, "first_name") {
        Some(first_name) => Profile {
            first_name,
            last_name: field(profile, "last_name"),
            display_name: None,
        },
        None => {
            let real_name = field(profile, "real_name")
                .or_else(|| field(Some(user), "real_name"))
                .or_else(|| field(Some(user), "name"))
                .unwrap_or_default();
            Profile::from_name(&real_name)
        }
    };
    result.display_name = field(profile, "display_name");
    result
}

#[async_trait]
impl Directory for SlackDirectory {
    async fn fetch_profile(&self, platform_id: &str) -> Result<Profile, DirectoryError> {
        let body = match self.get("users.info", &[("user", platform_id)]).await {
            Ok(body) => body,
            Err(DirectoryError::Api(code)) if code == "user_not_found" => {
                return Err(DirectoryError::NotFound(platform_id.to_string()));
            }
            Err(e) => return Err(e),
        };

        let user = body
            .get("user")
            .ok_or_else(|| DirectoryError::Api("users.info returned no user".into()))?;
        let profile = profile_from_user(user);
        if profile.first_name.is_empty() {
            return Err(DirectoryError::NotFound(platform_id.to_string()));
        }

        tracing::debug!(platform_id, first_name = %profile.first_name, "fetched Slack profile");
        Ok(profile)
    }

    async fn send_text(&self, channel: &str, text: &str) -> Result<(), DirectoryError> {
        self.post_message(json!({ "channel": channel, "text": text }))
            .await
    }

    async fn send_blocks(&self, channel: &str, blocks: &[Block]) -> Result<(), DirectoryError> {
        let blocks_json =
            serde_json::to_value(blocks).map_err(|e| DirectoryError::Api(e.to_string()))?;
        self.post_message(json!({
            "channel": channel,
            "text": render_plain_text(blocks),
            "blocks": blocks_json,
        }))
        .await
    }

    async fn bot_user_id(&self) -> Result<Option<String>, DirectoryError> {
        let body = self.post("auth.test", &json!({})).await?;
        let user_id = body
            .get("user_id")
            .and_then(Value::as_str)
            .ok_or_else(|| DirectoryError::Api("auth.test returned no user_id".into()))?;
        Ok(Some(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_prefers_explicit_names() {
        let user = json!({
            "id": "U1",
            "real_name": "Jamie Lee",
            "profile": {
                "first_name": "Jay",
                "last_name": "Lee-Smith",
                "real_name": "Jamie Lee",
                "display_name": "jay"
            }
        });
        let profile = profile_from_user(&user);
        assert_eq!(profile.first_name, "Jay");
        assert_eq!(profile.last_name.as_deref(), Some("Lee-Smith"));
        assert_eq!(profile.display_name.as_deref(), Some("jay"));
    }

    #[test]
    fn profile_splits_real_name() {
        let user = json!({
            "id": "U1",
            "profile": { "real_name": "Jamie Lee", "display_name": "" }
        });
        let profile = profile_from_user(&user);
        assert_eq!(profile.first_name, "Jamie");
        assert_eq!(profile.last_name.as_deref(), Some("Lee"));
        assert!(profile.display_name.is_none());
    }

    #[test]
    fn profile_falls_back_to_handle() {
        let user = json!({ "id": "U1", "name": "kai" });
        let profile = profile_from_user(&user);
        assert_eq!(profile.first_name, "kai");
    }

    #[test]
    fn new_trims_api_base() {
        let config = SlackConfig {
            api_base: "http://localhost:9/api/".into(),
            ..SlackConfig::default()
        };
        let directory = SlackDirectory::new(&config).unwrap();
        assert_eq!(directory.api_base, "http://localhost:9/api");
    }
}
