//! Archive record definitions.
//!
//! Defines [`Person`] (someone the bot has quotes for), [`Quote`] (something
//! they said), and the input shapes used to create and edit them.

use serde::{Deserialize, Serialize};

/// Someone the bot has quotes for.
///
/// At least one of `platform_id` / `ghost_id` is always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// UUID v7 primary key.
    pub id: String,
    /// Chat-platform user id, present while the person has a live account.
    pub platform_id: Option<String>,
    /// Synthetic handle for people without a platform account.
    pub ghost_id: Option<String>,
    /// Human-friendly label. Defaults to `ghost_id`.
    pub display_name: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 last-modification timestamp.
    pub updated_at: String,
}

impl Person {
    /// `true` for people tracked without a platform account.
    pub fn is_ghost(&self) -> bool {
        self.platform_id.is_none()
    }

    /// The id a caller would use to address this person: platform id first.
    pub fn user_id(&self) -> &str {
        self.platform_id
            .as_deref()
            .or(self.ghost_id.as_deref())
            .unwrap_or(&self.id)
    }

    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

/// Something a person said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// UUID v7 primary key.
    pub id: String,
    /// Owning person's id.
    pub person_id: String,
    pub content: String,
    /// RFC 3339 timestamp set at creation. Edits leave it untouched.
    pub created: String,
}

/// Fields for creating a [`Person`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPerson {
    pub platform_id: Option<String>,
    pub ghost_id: Option<String>,
    pub display_name: Option<String>,
    #[serde(default)]
    pub first_name: String,
    pub last_name: Option<String>,
}

impl NewPerson {
    /// A full record for someone the Directory knows.
    pub fn platform(platform_id: impl Into<String>, first_name: impl Into<String>) -> Self {
        Self {
            platform_id: Some(platform_id.into()),
            first_name: first_name.into(),
            ..Default::default()
        }
    }

    /// A bare record using the token as both ghost id and first name.
    pub fn ghost(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            ghost_id: Some(token.clone()),
            first_name: token,
            ..Default::default()
        }
    }
}

/// Partial update for a [`Person`].
///
/// `None` leaves a field unchanged. For the optional columns an empty string
/// clears the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonUpdate {
    pub platform_id: Option<String>,
    pub ghost_id: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl PersonUpdate {
    pub fn is_empty(&self) -> bool {
        self.platform_id.is_none()
            && self.ghost_id.is_none()
            && self.display_name.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
    }
}

/// Partial update for a [`Quote`]. `person_id` moves the quote to someone else.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteUpdate {
    pub content: Option<String>,
    pub person_id: Option<String>,
}

/// Normalize an optional text field: trimmed, empty becomes `None`.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
