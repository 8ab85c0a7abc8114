#![allow(dead_code)]

use async_trait::async_trait;
use nostalgia::archive::{self, NewPerson, Person};
use nostalgia::bot::reply::Block;
use nostalgia::bot::NostalgiaBot;
use nostalgia::db::{self, SharedDb};
use nostalgia::directory::{Directory, DirectoryError, Profile};
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const BOT_ID: &str = "UBOT";

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

pub fn shared_db() -> SharedDb {
    Arc::new(Mutex::new(test_db()))
}

/// A message the bot posted.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text { channel: String, text: String },
    Blocks { channel: String, blocks: Vec<Block> },
}

/// Directory with a fixed set of known users that records every message sent.
#[derive(Default)]
pub struct MockDirectory {
    profiles: Mutex<HashMap<String, Profile>>,
    failing: bool,
    pub sent: Mutex<Vec<Sent>>,
    pub lookups: Mutex<Vec<String>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A directory whose every lookup fails with a transport error.
    pub fn unreachable() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Register a user with a full name, split into first and last name.
    pub fn with_user(self, platform_id: &str, name: &str) -> Self {
        self.set_profile(platform_id, Profile::from_name(name));
        self
    }

    pub fn set_profile(&self, platform_id: &str, profile: Profile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(platform_id.to_string(), profile);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.lock().unwrap().len()
    }
}

#[async_trait]
impl Directory for MockDirectory {
    async fn fetch_profile(&self, platform_id: &str) -> Result<Profile, DirectoryError> {
        self.lookups.lock().unwrap().push(platform_id.to_string());
        if self.failing {
            return Err(DirectoryError::Network("connection refused".into()));
        }
        self.profiles
            .lock()
            .unwrap()
            .get(platform_id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(platform_id.to_string()))
    }

    async fn send_text(&self, channel: &str, text: &str) -> Result<(), DirectoryError> {
        self.sent.lock().unwrap().push(Sent::Text {
            channel: channel.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_blocks(&self, channel: &str, blocks: &[Block]) -> Result<(), DirectoryError> {
        self.sent.lock().unwrap().push(Sent::Blocks {
            channel: channel.to_string(),
            blocks: blocks.to_vec(),
        });
        Ok(())
    }
}

/// A bot over a fresh archive. Returns the pieces so tests can inspect them.
pub fn test_bot(directory: MockDirectory) -> (NostalgiaBot, SharedDb, Arc<MockDirectory>) {
    let db = shared_db();
    let directory = Arc::new(directory);
    let bot = NostalgiaBot::new(db.clone(), directory.clone(), Some(BOT_ID.to_string()));
    (bot, db, directory)
}

/// Insert a platform person with the given quotes.
pub fn seed_person(db: &SharedDb, platform_id: &str, first_name: &str, quotes: &[&str]) -> Person {
    let mut conn = db.lock().unwrap();
    let person = archive::create_person(&mut conn, &NewPerson::platform(platform_id, first_name)).unwrap();
    for quote in quotes {
        archive::create_quote(&mut conn, &person.id, quote).unwrap();
    }
    person
}

/// Insert a ghost person with the given quotes.
pub fn seed_ghost(db: &SharedDb, ghost_id: &str, quotes: &[&str]) -> Person {
    let mut conn = db.lock().unwrap();
    let person = archive::create_person(&mut conn, &NewPerson::ghost(ghost_id)).unwrap();
    for quote in quotes {
        archive::create_quote(&mut conn, &person.id, quote).unwrap();
    }
    person
}

pub fn quote_count(db: &SharedDb, person_id: &str) -> usize {
    archive::count_quotes(&db.lock().unwrap(), person_id).unwrap()
}
