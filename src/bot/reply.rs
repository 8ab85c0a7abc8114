//! Bot replies and their rendering.
//!
//! [`Block`] is the subset of Slack Block Kit the bot uses; it serializes to
//! the wire format directly.

use serde::{Deserialize, Serialize};

pub const HELLO: &str = "Hello!";
pub const UNRECOGNIZED: &str = "I wasn't able to make sense of this message";
pub const MEMORY_STORED: &str = "Memory stored!";
pub const MEMORY_EXISTS: &str = "I already remember that one! That memory already exists.";
pub const NO_MEMORIES: &str = "No memories to remember.";
pub const FAILED: &str = "Something went wrong on my end. Try again in a bit.";

/// Text object inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    PlainText { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        TextObject::PlainText { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        TextObject::Mrkdwn { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            TextObject::PlainText { text } | TextObject::Mrkdwn { text } => text,
        }
    }
}

/// A message layout block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { text: TextObject },
    Section { text: TextObject },
    Divider,
    Context { elements: Vec<TextObject> },
}

/// What the bot says back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Blocks(Vec<Block>),
}

impl Reply {
    /// Render for terminals and as notification fallback text.
    pub fn to_plain_text(&self) -> String {
        match self {
            Reply::Text(text) => text.clone(),
            Reply::Blocks(blocks) => render_plain_text(blocks),
        }
    }
}

/// Outcome of one command. `ok` is false only for unrecognized input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub ok: bool,
    pub reply: Reply,
}

impl ActionResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            ok: true,
            reply: Reply::Text(text.into()),
        }
    }

    pub fn blocks(blocks: Vec<Block>) -> Self {
        Self {
            ok: true,
            reply: Reply::Blocks(blocks),
        }
    }

    pub fn unrecognized() -> Self {
        Self {
            ok: false,
            reply: Reply::Text(UNRECOGNIZED.to_string()),
        }
    }

    /// Plain text of the reply.
    pub fn message(&self) -> String {
        self.reply.to_plain_text()
    }
}

pub fn render_plain_text(blocks: &[Block]) -> String {
    let mut lines = Vec::new();
    for block in blocks {
        match block {
            Block::Header { text } | Block::Section { text } => lines.push(text.text().to_string()),
            Block::Divider => lines.push("---".to_string()),
            Block::Context { elements } => {
                let parts: Vec<&str> = elements.iter().map(TextObject::text).collect();
                lines.push(parts.join(" "));
            }
        }
    }
    lines.join("\n")
}

pub fn dont_remember(name: &str) -> String {
    format!("I don't remember {name}.")
}

pub fn ambiguous(token: &str) -> String {
    format!("I know more than one person called {token}. Could you be more specific?")
}

/// `"content" - Name`
pub fn attributed(content: &str, first_name: &str) -> String {
    format!("\"{content}\" - {first_name}")
}

/// The command summary shown for `help`.
pub fn help_blocks() -> Vec<Block> {
    let commands = [
        ("hello", "Say hi."),
        (
            "remember [that|when] @user said \"something\"",
            "Store something a person said.",
        ),
        ("quote @user", "Recall something a person said."),
        (
            "remind me|@user... of @user",
            "Remind people of something a person said.",
        ),
        ("random quote", "Recall something anyone said."),
        (
            "converse @user, @user[, ...]",
            "Stage a conversation between two or more people.",
        ),
        ("help", "Show this message."),
    ];

    let mut blocks = vec![
        Block::Header {
            text: TextObject::plain("NostalgiaBot commands"),
        },
        Block::Divider,
    ];
    for (usage, description) in commands {
        blocks.push(Block::Section {
            text: TextObject::mrkdwn(format!("`{usage}`\n{description}")),
        });
    }
    blocks.push(Block::Divider);
    blocks.push(Block::Context {
        elements: vec![TextObject::mrkdwn(
            "Users can be @mentions, display names or ghost ids.",
        )],
    });
    blocks
}
