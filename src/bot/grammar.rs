//! Command grammar.
//!
//! [`parse`] classifies one line of chat text into a [`Command`]. Each intent
//! has its own case-insensitive pattern; they are tried in a fixed priority
//! order and the first match wins.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// A platform mention, optionally with a label: `<@U123>` or `<@U123|kai>`.
const MENTION: &str = r"<@[A-Za-z0-9]+(?:\|[^>]*)?>";
/// A mention or a bare name (`kai`, `@kai`, `jeff.b`).
const USER: &str = r"(?:<@[A-Za-z0-9]+(?:\|[^>]*)?>|@?\w(?:[\w.-]*\w)?)";

static USER_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:<@(?P<id>[A-Za-z0-9]+)(?:\|[^>]*)?>|@?(?P<name>\w(?:[\w.-]*\w)?))$")
        .expect("invalid user ref regex")
});

static HELLO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:hello|greetings|salutations|howdy)[\s!.?]*$").expect("invalid hello regex")
});

static HELP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^help[\s!.?]*$").expect("invalid help regex"));

static REMEMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)^remember\s+(?:(?:that|when)\s+)?(?P<user_refs>.+?)\s+said\s+["“”](?P<content>.*)["“”][\s!.?]*$"#,
    )
    .expect("invalid remember regex")
});

static QUOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^quote\s+(?P<user_ref>{USER})[\s!.?]*$")).expect("invalid quote regex")
});

static REMIND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^remind\s+(?P<targets>(?:me|{MENTION})(?:\s+(?:me|{MENTION}))*)\s+of\s+(?P<user_ref>{USER})[\s!.?]*$"
    ))
    .expect("invalid remind regex")
});

static REMIND_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\bme\b|{MENTION}")).expect("invalid remind target regex")
});

static RANDOM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^random\s+quote[\s!.?]*$").expect("invalid random regex"));

static CONVERSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^converse\s+(?P<user_refs>{USER}(?:\s*,\s*{USER})+)[\s!.?]*$"
    ))
    .expect("invalid converse regex")
});

/// Whitespace-separated user refs and nothing else. Mention labels may contain spaces.
static USER_LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^{USER}(?:\s+{USER})*$")).expect("invalid user list regex")
});

static USER_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(USER).expect("invalid user token regex"));

static ANY_MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<@(?P<id>[A-Za-z0-9]+)(?:\|[^>]*)?>").expect("invalid mention regex")
});

/// A reference to a person in a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserRef {
    /// A platform mention, unwrapped to the user id.
    Mention(String),
    /// A bare name: display name, ghost id or first name.
    Bare(String),
}

impl UserRef {
    /// Parse a single reference, unwrapping mention syntax.
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = USER_REF_RE.captures(raw.trim())?;
        if let Some(id) = caps.name("id") {
            return Some(UserRef::Mention(id.as_str().to_string()));
        }
        caps.name("name")
            .map(|name| UserRef::Bare(name.as_str().to_string()))
    }

    /// The token handed to the resolver.
    pub fn token(&self) -> &str {
        match self {
            UserRef::Mention(id) | UserRef::Bare(id) => id,
        }
    }

    pub fn is_mention(&self) -> bool {
        matches!(self, UserRef::Mention(_))
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRef::Mention(id) => write!(f, "<@{id}>"),
            UserRef::Bare(name) => write!(f, "{name}"),
        }
    }
}

/// Who a reminder is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderTarget {
    /// The literal `me`: whoever sent the command.
    Sender,
    /// A mentioned platform user id.
    User(String),
}

/// A classified chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Hello,
    Help,
    Remember { user: UserRef, content: String },
    Quote { user: UserRef },
    Remind { targets: Vec<ReminderTarget>, user: UserRef },
    Random,
    Converse { users: Vec<UserRef> },
    Unrecognized,
}

/// Strip mentions of the bot itself and surrounding whitespace.
pub fn normalize(text: &str, bot_user_id: Option<&str>) -> String {
    let Some(bot) = bot_user_id else {
        return text.trim().to_string();
    };
    ANY_MENTION_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            if &caps["id"] == bot {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .trim()
        .to_string()
}

/// Classify normalized text. Never fails: anything else is [`Command::Unrecognized`].
pub fn parse(text: &str, bot_user_id: Option<&str>) -> Command {
    let text = text.trim();

    let command = if HELLO_RE.is_match(text) {
        Some(Command::Hello)
    } else if HELP_RE.is_match(text) {
        Some(Command::Help)
    } else {
        parse_remember(text, bot_user_id)
            .or_else(|| parse_quote(text))
            .or_else(|| parse_remind(text))
            .or_else(|| RANDOM_RE.is_match(text).then_some(Command::Random))
            .or_else(|| parse_converse(text))
    };

    let command = command.unwrap_or(Command::Unrecognized);
    tracing::debug!(?command, "classified command");
    command
}

fn parse_remember(text: &str, bot_user_id: Option<&str>) -> Option<Command> {
    let caps = REMEMBER_RE.captures(text)?;
    let raw_refs = caps.name("user_refs")?.as_str();

    if !USER_LIST_RE.is_match(raw_refs) {
        return None;
    }

    let mut users: Vec<UserRef> = Vec::new();
    for found in USER_TOKEN_RE.find_iter(raw_refs) {
        let user = UserRef::parse(found.as_str())?;
        let is_bot = matches!(&user, UserRef::Mention(id) if Some(id.as_str()) == bot_user_id);
        if !is_bot && !users.contains(&user) {
            users.push(user);
        }
    }
    if users.len() != 1 {
        return None;
    }
    let user = users.remove(0);
    // "remember that said ..." leaves only the filler word
    if matches!(&user, UserRef::Bare(name) if name.eq_ignore_ascii_case("that") || name.eq_ignore_ascii_case("when"))
    {
        return None;
    }

    let content = unescape(caps.name("content")?.as_str());
    if content.trim().is_empty() {
        return None;
    }
    Some(Command::Remember { user, content })
}

fn parse_quote(text: &str) -> Option<Command> {
    let caps = QUOTE_RE.captures(text)?;
    let user = UserRef::parse(caps.name("user_ref")?.as_str())?;
    Some(Command::Quote { user })
}

fn parse_remind(text: &str) -> Option<Command> {
    let caps = REMIND_RE.captures(text)?;
    let user = UserRef::parse(caps.name("user_ref")?.as_str())?;

    let mut targets = Vec::new();
    for found in REMIND_TARGET_RE.find_iter(caps.name("targets")?.as_str()) {
        let target = match UserRef::parse(found.as_str()) {
            Some(UserRef::Mention(id)) => ReminderTarget::User(id),
            _ => ReminderTarget::Sender,
        };
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    if targets.is_empty() {
        return None;
    }
    Some(Command::Remind { targets, user })
}

fn parse_converse(text: &str) -> Option<Command> {
    let caps = CONVERSE_RE.captures(text)?;

    let mut users: Vec<UserRef> = Vec::new();
    for raw in caps.name("user_refs")?.as_str().split(',') {
        let user = UserRef::parse(raw)?;
        if !users.contains(&user) {
            users.push(user);
        }
    }
    if users.len() < 2 {
        return None;
    }
    Some(Command::Converse { users })
}

/// Undo the HTML escaping Slack applies to message text.
fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(id: &str) -> UserRef {
        UserRef::Mention(id.into())
    }

    #[test]
    fn greetings() {
        for text in ["hello", "Howdy!", "GREETINGS", "salutations."] {
            assert_eq!(parse(text, None), Command::Hello, "{text}");
        }
        assert_eq!(parse("hello there", None), Command::Unrecognized);
    }

    #[test]
    fn help_and_random() {
        assert_eq!(parse("help", None), Command::Help);
        assert_eq!(parse("Help?", None), Command::Help);
        assert_eq!(parse("random quote", None), Command::Random);
        assert_eq!(parse("Random   Quote!", None), Command::Random);
        assert_eq!(parse("random", None), Command::Unrecognized);
    }

    #[test]
    fn remember_with_mention() {
        assert_eq!(
            parse(r#"remember that <@U1> said "hello world""#, None),
            Command::Remember {
                user: mention("U1"),
                content: "hello world".into()
            }
        );
        assert_eq!(
            parse(r#"Remember when <@U1|kai> said "x""#, None),
            Command::Remember {
                user: mention("U1"),
                content: "x".into()
            }
        );
        assert_eq!(
            parse(r#"remember that <@U1> said "x"."#, None),
            Command::Remember {
                user: mention("U1"),
                content: "x".into()
            }
        );
        assert_eq!(
            parse(r#"remember that <@U1|Kai Lee> said "x"!"#, None),
            Command::Remember {
                user: mention("U1"),
                content: "x".into()
            }
        );
    }

    #[test]
    fn remember_without_filler_and_bare_name() {
        assert_eq!(
            parse(r#"remember jeff said "I'm hungry""#, None),
            Command::Remember {
                user: UserRef::Bare("jeff".into()),
                content: "I'm hungry".into()
            }
        );
    }

    #[test]
    fn remember_content_spans_first_to_last_quote() {
        assert_eq!(
            parse(r#"remember <@U1> said "she said "no" twice""#, None),
            Command::Remember {
                user: mention("U1"),
                content: r#"she said "no" twice"#.into()
            }
        );
    }

    #[test]
    fn remember_accepts_smart_quotes_and_unescapes() {
        assert_eq!(
            parse("remember <@U1> said “salt &amp; pepper &lt;3”", None),
            Command::Remember {
                user: mention("U1"),
                content: "salt & pepper <3".into()
            }
        );
    }

    #[test]
    fn remember_rejects_two_targets() {
        assert_eq!(
            parse(r#"remember that <@U1> <@U2> said "x""#, None),
            Command::Unrecognized
        );
    }

    #[test]
    fn remember_same_target_twice_is_one_target() {
        assert_eq!(
            parse(r#"remember <@U1> <@U1> said "x""#, None),
            Command::Remember {
                user: mention("U1"),
                content: "x".into()
            }
        );
    }

    #[test]
    fn remember_ignores_bot_mention_among_targets() {
        assert_eq!(
            parse(r#"remember <@BOT> <@U1> said "x""#, Some("BOT")),
            Command::Remember {
                user: mention("U1"),
                content: "x".into()
            }
        );
    }

    #[test]
    fn remember_rejects_single_quotes_and_empty() {
        assert_eq!(parse("remember that <@U1> said 'x'", None), Command::Unrecognized);
        assert_eq!(parse(r#"remember that <@U1> said """#, None), Command::Unrecognized);
        assert_eq!(parse(r#"remember said "x""#, None), Command::Unrecognized);
        assert_eq!(parse(r#"remember that said "x""#, None), Command::Unrecognized);
    }

    #[test]
    fn quote_command() {
        assert_eq!(parse("quote <@U1>", None), Command::Quote { user: mention("U1") });
        assert_eq!(
            parse("Quote jeff.", None),
            Command::Quote {
                user: UserRef::Bare("jeff".into())
            }
        );
        assert_eq!(parse("quote", None), Command::Unrecognized);
        assert_eq!(parse("quote <@U1> <@U2>", None), Command::Unrecognized);
    }

    #[test]
    fn remind_command() {
        assert_eq!(
            parse("remind me of <@U1>", None),
            Command::Remind {
                targets: vec![ReminderTarget::Sender],
                user: mention("U1")
            }
        );
        assert_eq!(
            parse("Remind <@U2> me <@U3> of kai", None),
            Command::Remind {
                targets: vec![
                    ReminderTarget::User("U2".into()),
                    ReminderTarget::Sender,
                    ReminderTarget::User("U3".into())
                ],
                user: UserRef::Bare("kai".into())
            }
        );
        assert_eq!(parse("remind of <@U1>", None), Command::Unrecognized);
    }

    #[test]
    fn converse_command() {
        assert_eq!(
            parse("converse <@U1>, <@U2>,jeff", None),
            Command::Converse {
                users: vec![mention("U1"), mention("U2"), UserRef::Bare("jeff".into())]
            }
        );
    }

    #[test]
    fn converse_needs_two_distinct_targets() {
        assert_eq!(parse("converse <@U1>", None), Command::Unrecognized);
        assert_eq!(parse("converse <@U1>, <@U1>", None), Command::Unrecognized);
    }

    #[test]
    fn normalize_strips_bot_mentions() {
        assert_eq!(normalize("  <@BOT> hello ", Some("BOT")), "hello");
        assert_eq!(normalize("<@BOT|nostalgia> quote <@U1>", Some("BOT")), "quote <@U1>");
        assert_eq!(normalize(" <@BOT> hi ", None), "<@BOT> hi");
    }

    #[test]
    fn user_ref_display() {
        assert_eq!(mention("U1").to_string(), "<@U1>");
        assert_eq!(UserRef::parse("@kai"), Some(UserRef::Bare("kai".into())));
        assert_eq!(UserRef::parse("<@U1|kai>"), Some(mention("U1")));
        assert_eq!(UserRef::parse("two words"), None);
    }

    #[test]
    fn unrecognized_text() {
        assert_eq!(parse("what's up", None), Command::Unrecognized);
        assert_eq!(parse("", None), Command::Unrecognized);
    }
}
