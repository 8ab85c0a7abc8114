//! Slack Events API endpoint.
//!
//! Answers the `url_verification` handshake. Mentions of the bot and direct
//! messages are acknowledged at once and handled on a background task, since
//! Slack retries any event not acked within three seconds.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;

/// Top-level Events API payload.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventsPayload {
    UrlVerification { challenge: String },
    EventCallback { event: Value },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEvent {
    AppMention(MessageEvent),
    Message(MessageEvent),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct MessageEvent {
    pub user: Option<String>,
    #[serde(default)]
    pub text: String,
    pub channel: String,
    pub channel_type: Option<String>,
    pub subtype: Option<String>,
    pub bot_id: Option<String>,
}

impl MessageEvent {
    pub fn is_bot_message(&self) -> bool {
        self.bot_id.is_some() || self.subtype.as_deref() == Some("bot_message")
    }

    pub fn is_direct_message(&self) -> bool {
        self.channel.starts_with('D') || self.channel_type.as_deref() == Some("im")
    }
}

/// Decide whether an event is a command for the bot: `(channel, sender, text)`.
///
/// Channel messages that mention the bot also arrive as `app_mention`, so plain
/// messages are only taken from direct conversations.
pub fn command_from_event(event: SlackEvent, bot_user_id: Option<&str>) -> Option<(String, String, String)> {
    let (message, is_mention) = match event {
        SlackEvent::AppMention(message) => (message, true),
        SlackEvent::Message(message) => (message, false),
        SlackEvent::Unknown => return None,
    };

    if message.subtype.is_some() || message.is_bot_message() {
        return None;
    }
    if !is_mention && !message.is_direct_message() {
        return None;
    }
    let sender = message.user?;
    if Some(sender.as_str()) == bot_user_id {
        return None;
    }
    Some((message.channel, sender, message.text))
}

pub async fn handle(State(state): State<AppState>, Json(payload): Json<EventsPayload>) -> Response {
    match payload {
        EventsPayload::UrlVerification { challenge } => {
            Json(json!({ "challenge": challenge })).into_response()
        }
        EventsPayload::EventCallback { event } => {
            let event: SlackEvent = match serde_json::from_value(event) {
                Ok(event) => event,
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring unparseable event");
                    return StatusCode::OK.into_response();
                }
            };

            if let Some((channel, sender, text)) = command_from_event(event, state.bot.bot_user_id()) {
                let bot = state.bot.clone();
                tokio::spawn(async move {
                    if let Err(e) = bot.respond(&channel, &sender, &text).await {
                        tracing::error!(error = %e, channel = %channel, "failed to handle command");
                    }
                });
            }
            StatusCode::OK.into_response()
        }
        EventsPayload::Unknown => StatusCode::OK.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(value: Value) -> SlackEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn app_mention_is_a_command() {
        let parsed = command_from_event(
            event(json!({
                "type": "app_mention",
                "user": "U1",
                "text": "<@BOT> hello",
                "channel": "C1",
                "ts": "1.0"
            })),
            Some("BOT"),
        );
        assert_eq!(
            parsed,
            Some(("C1".to_string(), "U1".to_string(), "<@BOT> hello".to_string()))
        );
    }

    #[test]
    fn bot_and_edited_messages_are_ignored() {
        let from_bot = event(json!({
            "type": "message", "text": "hi", "channel": "D1", "bot_id": "B1"
        }));
        assert!(command_from_event(from_bot, None).is_none());

        let edited = event(json!({
            "type": "message", "user": "U1", "text": "hi", "channel": "D1",
            "subtype": "message_changed"
        }));
        assert!(command_from_event(edited, None).is_none());
    }

    #[test]
    fn channel_messages_need_a_mention() {
        let channel = event(json!({
            "type": "message", "user": "U1", "text": "hello", "channel": "C1",
            "channel_type": "channel"
        }));
        assert!(command_from_event(channel, None).is_none());

        let dm = event(json!({
            "type": "message", "user": "U1", "text": "hello", "channel": "D1",
            "channel_type": "im"
        }));
        assert!(command_from_event(dm, None).is_some());
    }

    #[test]
    fn own_messages_are_ignored() {
        let own = event(json!({
            "type": "message", "user": "BOT", "text": "Hello!", "channel": "D1"
        }));
        assert!(command_from_event(own, Some("BOT")).is_none());
    }

    #[test]
    fn unknown_events_parse() {
        assert!(matches!(event(json!({ "type": "reaction_added" })), SlackEvent::Unknown));
    }
}
