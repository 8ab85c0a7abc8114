//! The chat bot: turns one line of chat text into a reply.
//!
//! Text is normalized, classified by [`grammar::parse`], and dispatched to one
//! method per intent. Every command is handled from scratch using only the
//! archive and the current message.
//!
//! Routine outcomes (unknown person, ambiguous name, duplicate quote) become
//! ordinary replies. Only storage and Directory transport failures come back
//! as errors.

pub mod grammar;
pub mod reply;

use std::sync::Arc;

use grammar::{Command, ReminderTarget, UserRef};
use reply::{ActionResult, Reply};

use crate::archive::{self, NewPerson, Person, Quote, Resolution};
use crate::db::{with_db, SharedDb};
use crate::directory::{Directory, DirectoryError, Profile};
use crate::error::{ArchiveError, ArchiveResult};

/// Quotes per person in a staged conversation.
const CONVERSE_ROUNDS: usize = 2;

/// Result of looking up a person for recall.
enum Recall {
    Found { quote: Quote, person: Person },
    Reply(String),
}

/// Outcome of resolving a reference for commands that need an existing person.
enum Lookup {
    Person(Person),
    Unknown,
    Ambiguous,
}

#[derive(Clone)]
pub struct NostalgiaBot {
    db: SharedDb,
    directory: Arc<dyn Directory>,
    bot_user_id: Option<String>,
}

impl NostalgiaBot {
    pub fn new(db: SharedDb, directory: Arc<dyn Directory>, bot_user_id: Option<String>) -> Self {
        Self {
            db,
            directory,
            bot_user_id,
        }
    }

    pub fn bot_user_id(&self) -> Option<&str> {
        self.bot_user_id.as_deref()
    }

    /// Handle a command and post the reply to `channel`.
    ///
    /// When the command fails the channel still gets [`reply::FAILED`] and the
    /// error is returned.
    pub async fn respond(&self, channel: &str, sender: &str, text: &str) -> ArchiveResult<()> {
        let result = match self.handle(sender, text).await {
            Ok(result) => result,
            Err(e) => {
                if let Err(send_err) = self.directory.send_text(channel, reply::FAILED).await {
                    tracing::warn!(channel, error = %send_err, "could not report failure");
                }
                return Err(e);
            }
        };
        match &result.reply {
            Reply::Text(text) => self.directory.send_text(channel, text).await?,
            Reply::Blocks(blocks) => self.directory.send_blocks(channel, blocks).await?,
        }
        Ok(())
    }

    /// Normalize, classify and execute one line of chat text from `sender`.
    pub async fn handle(&self, sender: &str, text: &str) -> ArchiveResult<ActionResult> {
        let normalized = grammar::normalize(text, self.bot_user_id());
        let command = grammar::parse(&normalized, self.bot_user_id());
        self.execute(sender, command).await
    }

    pub async fn execute(&self, sender: &str, command: Command) -> ArchiveResult<ActionResult> {
        let result = match command {
            Command::Hello => self.hello(),
            Command::Help => self.help(),
            Command::Remember { user, content } => self.remember(&user, &content).await?,
            Command::Quote { user } => self.quote(&user).await?,
            Command::Remind { targets, user } => self.remind(sender, &targets, &user).await?,
            Command::Random => self.random().await?,
            Command::Converse { users } => self.converse(&users).await?,
            Command::Unrecognized => ActionResult::unrecognized(),
        };
        tracing::info!(sender, ok = result.ok, "command handled");
        Ok(result)
    }

    pub fn hello(&self) -> ActionResult {
        ActionResult::text(reply::HELLO)
    }

    pub fn help(&self) -> ActionResult {
        ActionResult::blocks(reply::help_blocks())
    }

    /// Store `content` for the referenced person, creating them if needed.
    pub async fn remember(&self, user: &UserRef, content: &str) -> ArchiveResult<ActionResult> {
        let person = match self.resolve(user).await? {
            Resolution::Ambiguous(_) => {
                return Ok(ActionResult::text(reply::ambiguous(&user.to_string())))
            }
            Resolution::Found { person, live } => {
                if live {
                    self.sync(person).await?
                } else {
                    person
                }
            }
            Resolution::NotFound => self.create_person_for(user).await?,
        };

        let person_id = person.id.clone();
        let content = content.to_string();
        let stored = with_db(&self.db, move |conn| {
            if archive::has_said(conn, &person_id, &content)? {
                return Ok(false);
            }
            match archive::create_quote(conn, &person_id, &content) {
                Ok(_) => Ok(true),
                Err(ArchiveError::QuoteAlreadyExists) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await?;

        if stored {
            tracing::info!(person_id = %person.id, "memory stored");
            Ok(ActionResult::text(reply::MEMORY_STORED))
        } else {
            tracing::debug!(person_id = %person.id, "memory already exists");
            Ok(ActionResult::text(reply::MEMORY_EXISTS))
        }
    }

    /// Reply with one random quote of the referenced person.
    pub async fn quote(&self, user: &UserRef) -> ArchiveResult<ActionResult> {
        match self.recall(user).await? {
            Recall::Found { quote, .. } => Ok(ActionResult::text(quote.content)),
            Recall::Reply(text) => Ok(ActionResult::text(text)),
        }
    }

    /// Remind the targets (the sender for `me`) of something the person said.
    pub async fn remind(
        &self,
        sender: &str,
        targets: &[ReminderTarget],
        user: &UserRef,
    ) -> ArchiveResult<ActionResult> {
        let (quote, person) = match self.recall(user).await? {
            Recall::Found { quote, person } => (quote, person),
            Recall::Reply(text) => return Ok(ActionResult::text(text)),
        };

        let mentions: Vec<String> = targets
            .iter()
            .map(|target| match target {
                ReminderTarget::Sender => format!("<@{sender}>"),
                ReminderTarget::User(id) => format!("<@{id}>"),
            })
            .collect();

        Ok(ActionResult::text(format!(
            "{} Do you remember this?\n\n{}",
            mentions.join(" "),
            reply::attributed(&quote.content, &person.first_name)
        )))
    }

    /// One quote drawn from the whole archive.
    pub async fn random(&self) -> ArchiveResult<ActionResult> {
        let picked = with_db(&self.db, |conn| archive::random_quote_any_person(conn)).await?;
        Ok(match picked {
            Some((quote, person)) => {
                ActionResult::text(reply::attributed(&quote.content, &person.first_name))
            }
            None => ActionResult::text(reply::NO_MEMORIES),
        })
    }

    /// Stage a conversation: two rounds, one line per person per round.
    pub async fn converse(&self, users: &[UserRef]) -> ArchiveResult<ActionResult> {
        let mut people: Vec<Person> = Vec::new();
        let mut unknown = Vec::new();
        let mut ambiguous = Vec::new();

        for user in users {
            match self.lookup(user).await? {
                Lookup::Person(person) => {
                    if !people.iter().any(|p| p.id == person.id) {
                        people.push(person);
                    }
                }
                Lookup::Unknown => unknown.push(user.to_string()),
                Lookup::Ambiguous => ambiguous.push(user.to_string()),
            }
        }

        if !unknown.is_empty() {
            return Ok(ActionResult::text(reply::dont_remember(&unknown.join(", "))));
        }
        if let Some(token) = ambiguous.first() {
            return Ok(ActionResult::text(reply::ambiguous(token)));
        }
        if people.len() < 2 {
            return Ok(ActionResult::unrecognized());
        }

        let ids: Vec<String> = people.iter().map(|p| p.id.clone()).collect();
        let samples = with_db(&self.db, move |conn| {
            ids.iter()
                .map(|id| archive::random_quotes_for_person(conn, id, CONVERSE_ROUNDS))
                .collect::<ArchiveResult<Vec<_>>>()
        })
        .await?;

        let silent: Vec<&str> = people
            .iter()
            .zip(&samples)
            .filter(|(_, quotes)| quotes.is_empty())
            .map(|(person, _)| person.first_name.as_str())
            .collect();
        if !silent.is_empty() {
            return Ok(ActionResult::text(format!(
                "I don't remember anything from {}.",
                silent.join(", ")
            )));
        }

        let mut lines = Vec::with_capacity(people.len() * CONVERSE_ROUNDS);
        for round in 0..CONVERSE_ROUNDS {
            for (person, quotes) in people.iter().zip(&samples) {
                let quote = &quotes[round % quotes.len()];
                lines.push(format!("{}: {}", person.first_name, quote.content));
            }
        }
        Ok(ActionResult::text(lines.join("\n")))
    }

    async fn resolve(&self, user: &UserRef) -> ArchiveResult<Resolution> {
        let token = user.token().to_string();
        with_db(&self.db, move |conn| archive::resolve(conn, &token)).await
    }

    /// Resolve and sync a person who must already exist.
    async fn lookup(&self, user: &UserRef) -> ArchiveResult<Lookup> {
        Ok(match self.resolve(user).await? {
            Resolution::Found { person, live: true } => Lookup::Person(self.sync(person).await?),
            Resolution::Found { person, .. } => Lookup::Person(person),
            Resolution::NotFound => Lookup::Unknown,
            Resolution::Ambiguous(_) => Lookup::Ambiguous,
        })
    }

    /// Pick a random quote of the referenced person, or the reply explaining
    /// why there is none.
    async fn recall(&self, user: &UserRef) -> ArchiveResult<Recall> {
        let person = match self.lookup(user).await? {
            Lookup::Person(person) => person,
            Lookup::Unknown => {
                let name = self.display_name_for(user).await;
                return Ok(Recall::Reply(reply::dont_remember(&name)));
            }
            Lookup::Ambiguous => return Ok(Recall::Reply(reply::ambiguous(&user.to_string()))),
        };

        let person_id = person.id.clone();
        let mut quotes =
            with_db(&self.db, move |conn| archive::random_quotes_for_person(conn, &person_id, 1))
                .await?;

        match quotes.pop() {
            Some(quote) => Ok(Recall::Found { quote, person }),
            None => Ok(Recall::Reply(reply::dont_remember(&person.first_name))),
        }
    }

    /// Refresh a live person from the Directory. Failures keep the stored record.
    async fn sync(&self, person: Person) -> ArchiveResult<Person> {
        let Some(platform_id) = person.platform_id.clone() else {
            return Ok(person);
        };
        let profile = match self.directory.fetch_profile(&platform_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(person_id = %person.id, error = %e, "profile sync skipped");
                return Ok(person);
            }
        };

        let stored = person.clone();
        let synced = with_db(&self.db, move |conn| {
            archive::sync_profile(conn, &stored, &profile)
        })
        .await;
        match synced {
            Ok(person) => Ok(person),
            Err(e) if e.is_conflict() => {
                tracing::warn!(person_id = %person.id, error = %e, "profile sync conflicted");
                Ok(person)
            }
            Err(e) => Err(e),
        }
    }

    /// Create a person for an unknown reference: from the Directory profile
    /// when the platform knows them, else as a ghost named after the token.
    async fn create_person_for(&self, user: &UserRef) -> ArchiveResult<Person> {
        let token = user.token().to_string();
        let profile: Option<Profile> = match self.directory.fetch_profile(&token).await {
            Ok(profile) => Some(profile),
            Err(DirectoryError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };

        let created = {
            let token = token.clone();
            with_db(&self.db, move |conn| match &profile {
                Some(profile) => archive::create_from_profile(conn, &token, profile),
                None => archive::create_person(conn, &NewPerson::ghost(token.as_str())),
            })
            .await
        };

        match created {
            Ok(person) => Ok(person),
            // someone else created them first
            Err(e) if e.is_conflict() => match self.resolve(user).await? {
                Resolution::Found { person, .. } => Ok(person),
                _ => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    /// Best-effort name for someone the archive does not know.
    async fn display_name_for(&self, user: &UserRef) -> String {
        if let UserRef::Mention(id) = user {
            match self.directory.fetch_profile(id).await {
                Ok(profile) => return profile.first_name,
                Err(e) => tracing::debug!(platform_id = %id, error = %e, "no profile for unknown user"),
            }
        }
        user.to_string()
    }
}
