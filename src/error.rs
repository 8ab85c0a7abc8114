//! Error types for archive operations.
//!
//! Routine conversational outcomes (unknown person, ambiguous name, duplicate
//! quote) surface here only from the Store and REST boundary; the command
//! dispatcher turns them into replies before they reach the chat loop.

use thiserror::Error;

use crate::directory::DirectoryError;

/// Errors raised by the Store and the operations built on it.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// No person matches the given identifier.
    #[error("Person {0} does not exist")]
    PersonNotFound(String),

    /// A name matched more than one person.
    #[error("More than one person matches {0}")]
    MultiplePersonsFound(String),

    /// No quote with this id (or not owned by the given person).
    #[error("Quote {0} does not exist")]
    QuoteNotFound(String),

    /// The person already has a quote with this content (case-insensitive).
    #[error("The quote content provided already exists for this person")]
    QuoteAlreadyExists,

    /// A unique person field is already taken.
    #[error("Person with {field} {value} already exists")]
    PersonAlreadyExists {
        /// `platform_id`, `ghost_id` or `display_name`.
        field: &'static str,
        value: String,
    },

    /// A required field was missing or empty.
    #[error("Missing required field(s): {0}")]
    EmptyRequiredField(String),

    /// The Directory failed for a reason other than an unknown user.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Underlying SQLite failure.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Lock poisoning or a failed blocking task.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ArchiveError {
    /// Build an [`ArchiveError::EmptyRequiredField`] from the offending field names.
    pub fn empty_fields(fields: &[&str]) -> Self {
        ArchiveError::EmptyRequiredField(fields.join(", "))
    }

    /// Whether the error is a uniqueness conflict (HTTP 409).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ArchiveError::QuoteAlreadyExists | ArchiveError::PersonAlreadyExists { .. }
        )
    }
}

/// Result type for archive operations.
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

/// Whether a SQLite error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
