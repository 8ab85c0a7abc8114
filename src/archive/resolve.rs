//! Identity resolution: turning a chat token into a stored [`Person`].
//!
//! Lookup order is platform id, display name, ghost id. When none of those
//! match, a case-insensitive first-name match is tried; more than one hit there
//! is reported as [`Resolution::Ambiguous`] rather than picking one.

use rusqlite::Connection;

use super::person::{
    create_person, people_by_first_name, person_by_display_name, person_by_ghost_id,
    person_by_platform_id, update_person,
};
use super::types::{NewPerson, Person, PersonUpdate};
use crate::directory::Profile;
use crate::error::{ArchiveError, ArchiveResult};

/// Outcome of resolving a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// `live` is true when the token matched a platform id, so the record
    /// should be refreshed from the Directory before use.
    Found { person: Person, live: bool },
    NotFound,
    /// Several people share the name the token matched.
    Ambiguous(Vec<Person>),
}

/// Resolve a bare (already unwrapped) token.
pub fn resolve(conn: &Connection, token: &str) -> ArchiveResult<Resolution> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(Resolution::NotFound);
    }

    if let Some(person) = person_by_platform_id(conn, token)? {
        tracing::debug!(token, person_id = %person.id, "resolved by platform id");
        return Ok(Resolution::Found { person, live: true });
    }
    if let Some(person) = person_by_display_name(conn, token)? {
        tracing::debug!(token, person_id = %person.id, "resolved by display name");
        return Ok(Resolution::Found { person, live: false });
    }
    if let Some(person) = person_by_ghost_id(conn, token)? {
        tracing::debug!(token, person_id = %person.id, "resolved by ghost id");
        return Ok(Resolution::Found { person, live: false });
    }

    let mut candidates = people_by_first_name(conn, token)?;
    match candidates.len() {
        0 => {
            tracing::debug!(token, "token did not resolve");
            Ok(Resolution::NotFound)
        }
        1 => {
            let person = candidates.remove(0);
            tracing::debug!(token, person_id = %person.id, "resolved by first name");
            Ok(Resolution::Found { person, live: false })
        }
        n => {
            tracing::debug!(token, candidates = n, "token is ambiguous");
            Ok(Resolution::Ambiguous(candidates))
        }
    }
}

/// Resolve a token or fail, for callers that want errors instead of outcomes.
pub fn resolve_person(conn: &Connection, token: &str) -> ArchiveResult<Person> {
    match resolve(conn, token)? {
        Resolution::Found { person, .. } => Ok(person),
        Resolution::NotFound => Err(ArchiveError::PersonNotFound(token.to_string())),
        Resolution::Ambiguous(_) => Err(ArchiveError::MultiplePersonsFound(token.to_string())),
    }
}

/// Create a platform person from a Directory profile.
///
/// The profile's display name is dropped when someone else already holds it.
pub fn create_from_profile(
    conn: &mut Connection,
    platform_id: &str,
    profile: &Profile,
) -> ArchiveResult<Person> {
    let display_name = match &profile.display_name {
        Some(name) if person_by_display_name(conn, name)?.is_none() => Some(name.clone()),
        _ => None,
    };
    let new = NewPerson {
        platform_id: Some(platform_id.to_string()),
        display_name,
        first_name: profile.first_name.clone(),
        last_name: profile.last_name.clone(),
        ..Default::default()
    };
    create_person(conn, &new)
}

/// Refresh a person's name fields from their platform profile.
///
/// Only changed fields are written. A display name held by someone else is
/// left as it is.
pub fn sync_profile(conn: &mut Connection, person: &Person, profile: &Profile) -> ArchiveResult<Person> {
    let mut update = PersonUpdate::default();

    let first_name = profile.first_name.trim();
    if !first_name.is_empty() && first_name != person.first_name {
        update.first_name = Some(first_name.to_string());
    }
    if profile.last_name != person.last_name {
        update.last_name = Some(profile.last_name.clone().unwrap_or_default());
    }
    if let Some(name) = &profile.display_name {
        if person.display_name.as_ref() != Some(name) {
            match person_by_display_name(conn, name)? {
                Some(holder) if holder.id != person.id => {
                    tracing::debug!(
                        person_id = %person.id,
                        display_name = %name,
                        "display name taken, not syncing it"
                    );
                }
                _ => update.display_name = Some(name.clone()),
            }
        }
    }

    if update.is_empty() {
        return Ok(person.clone());
    }
    tracing::debug!(person_id = %person.id, "syncing profile from directory");
    update_person(conn, &person.id, &update)
}
