//! NostalgiaBot: a chat bot that remembers what people said.
//!
//! People and their quotes live in a SQLite archive. They are reachable two
//! ways: free-text chat commands (`remember that @kai said "..."`, `quote @kai`,
//! `converse @kai, @jeff`) and a JSON REST API.
//!
//! # Architecture
//!
//! - **Storage**: SQLite via rusqlite, forward-only migrations
//! - **Commands**: regex grammar classifying text into a [`bot::grammar::Command`],
//!   dispatched by [`bot::NostalgiaBot`]
//! - **Platform**: a [`directory::Directory`] for profile lookups and replies,
//!   backed by the Slack Web API
//! - **Transport**: axum HTTP server with the REST routes and Slack Events API
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema and migrations
//! - [`archive`]: People, quotes and identity resolution
//! - [`bot`]: Command grammar, dispatcher and replies
//! - [`directory`]: Chat-platform profile lookups and messaging
//! - [`api`]: REST and Slack Events handlers
//! - [`server`]: Server startup

pub mod api;
pub mod archive;
pub mod bot;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod server;
