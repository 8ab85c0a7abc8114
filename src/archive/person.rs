//! Person storage: lookups, creation, edits, and cascading deletion.
//!
//! Every write runs inside a transaction and re-reads the row before commit so
//! callers see server-assigned fields (id, timestamps).

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

use super::types::{non_empty, NewPerson, Person, PersonUpdate};
use crate::error::{is_unique_violation, ArchiveError, ArchiveResult};

const PERSON_COLUMNS: &str =
    "id, platform_id, ghost_id, display_name, first_name, last_name, created_at, updated_at";

/// Columns that must be unique across all people.
const UNIQUE_FIELDS: [&str; 3] = ["platform_id", "ghost_id", "display_name"];

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        platform_id: row.get(1)?,
        ghost_id: row.get(2)?,
        display_name: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn person_by(conn: &Connection, column: &str, value: &str) -> ArchiveResult<Option<Person>> {
    let sql = format!("SELECT {PERSON_COLUMNS} FROM people WHERE {column} = ?1");
    Ok(conn
        .query_row(&sql, params![value], person_from_row)
        .optional()?)
}

/// Fetch a person by internal id.
pub fn get_person(conn: &Connection, id: &str) -> ArchiveResult<Option<Person>> {
    person_by(conn, "id", id)
}

pub fn person_by_platform_id(conn: &Connection, platform_id: &str) -> ArchiveResult<Option<Person>> {
    person_by(conn, "platform_id", platform_id)
}

pub fn person_by_ghost_id(conn: &Connection, ghost_id: &str) -> ArchiveResult<Option<Person>> {
    person_by(conn, "ghost_id", ghost_id)
}

pub fn person_by_display_name(
    conn: &Connection,
    display_name: &str,
) -> ArchiveResult<Option<Person>> {
    person_by(conn, "display_name", display_name)
}

/// Everyone whose first name matches, ignoring case.
pub fn people_by_first_name(conn: &Connection, first_name: &str) -> ArchiveResult<Vec<Person>> {
    let sql = format!(
        "SELECT {PERSON_COLUMNS} FROM people WHERE first_name = ?1 COLLATE NOCASE ORDER BY created_at"
    );
    let mut stmt = conn.prepare(&sql)?;
    let people = stmt
        .query_map(params![first_name], person_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(people)
}

pub fn all_people(conn: &Connection) -> ArchiveResult<Vec<Person>> {
    let sql = format!("SELECT {PERSON_COLUMNS} FROM people ORDER BY first_name, created_at");
    let mut stmt = conn.prepare(&sql)?;
    let people = stmt
        .query_map([], person_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(people)
}

/// Pick one person uniformly at random, or `None` if there are none.
pub fn random_person(conn: &Connection) -> ArchiveResult<Option<Person>> {
    let sql = format!("SELECT {PERSON_COLUMNS} FROM people ORDER BY RANDOM() LIMIT 1");
    Ok(conn.query_row(&sql, [], person_from_row).optional()?)
}

/// Create a person.
///
/// Requires `first_name` and at least one of `platform_id` / `ghost_id`.
/// `display_name` defaults to `ghost_id` when that name is still free.
pub fn create_person(conn: &mut Connection, new: &NewPerson) -> ArchiveResult<Person> {
    let platform_id = non_empty(new.platform_id.as_deref());
    let ghost_id = non_empty(new.ghost_id.as_deref());
    let mut display_name = non_empty(new.display_name.as_deref());
    let first_name = new.first_name.trim().to_string();
    let last_name = non_empty(new.last_name.as_deref());

    let mut missing = Vec::new();
    if platform_id.is_none() && ghost_id.is_none() {
        missing.push("platform_id or ghost_id");
    }
    if first_name.is_empty() {
        missing.push("first_name");
    }
    if !missing.is_empty() {
        return Err(ArchiveError::empty_fields(&missing));
    }

    let tx = conn.transaction()?;

    ensure_unique(&tx, "platform_id", platform_id.as_deref(), None)?;
    ensure_unique(&tx, "ghost_id", ghost_id.as_deref(), None)?;
    ensure_unique(&tx, "display_name", display_name.as_deref(), None)?;

    if display_name.is_none() {
        if let Some(ghost) = &ghost_id {
            if person_by_display_name(&tx, ghost)?.is_none() {
                display_name = Some(ghost.clone());
            }
        }
    }

    let id = uuid::Uuid::now_v7().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    tx.execute(
        "INSERT INTO people (id, platform_id, ghost_id, display_name, first_name, last_name, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![id, platform_id, ghost_id, display_name, first_name, last_name, now],
    )
    .map_err(|e| map_unique_violation(e, &platform_id, &ghost_id, &display_name))?;

    let person = refresh(&tx, &id)?;
    tx.commit()?;

    tracing::info!(
        person_id = %person.id,
        platform_id = ?person.platform_id,
        ghost_id = ?person.ghost_id,
        "person created"
    );
    Ok(person)
}

/// Apply a partial update to a person.
///
/// Re-checks the identity invariant and uniqueness against everyone else.
pub fn update_person(conn: &mut Connection, id: &str, update: &PersonUpdate) -> ArchiveResult<Person> {
    let tx = conn.transaction()?;

    let current = get_person(&tx, id)?.ok_or_else(|| ArchiveError::PersonNotFound(id.to_string()))?;

    let platform_id = match &update.platform_id {
        Some(v) => non_empty(Some(v.as_str())),
        None => current.platform_id.clone(),
    };
    let ghost_id = match &update.ghost_id {
        Some(v) => non_empty(Some(v.as_str())),
        None => current.ghost_id.clone(),
    };
    let display_name = match &update.display_name {
        Some(v) => non_empty(Some(v.as_str())),
        None => current.display_name.clone(),
    };
    let last_name = match &update.last_name {
        Some(v) => non_empty(Some(v.as_str())),
        None => current.last_name.clone(),
    };
    let first_name = match &update.first_name {
        Some(v) => v.trim().to_string(),
        None => current.first_name.clone(),
    };

    if first_name.is_empty() {
        return Err(ArchiveError::empty_fields(&["first_name"]));
    }
    if platform_id.is_none() && ghost_id.is_none() {
        return Err(ArchiveError::empty_fields(&["platform_id or ghost_id"]));
    }

    ensure_unique(&tx, "platform_id", platform_id.as_deref(), Some(id))?;
    ensure_unique(&tx, "ghost_id", ghost_id.as_deref(), Some(id))?;
    ensure_unique(&tx, "display_name", display_name.as_deref(), Some(id))?;

    let now = chrono::Utc::now().to_rfc3339();
    tx.execute(
        "UPDATE people SET platform_id = ?1, ghost_id = ?2, display_name = ?3, first_name = ?4, \
         last_name = ?5, updated_at = ?6 WHERE id = ?7",
        params![platform_id, ghost_id, display_name, first_name, last_name, now, id],
    )
    .map_err(|e| map_unique_violation(e, &platform_id, &ghost_id, &display_name))?;

    let person = refresh(&tx, id)?;
    tx.commit()?;

    tracing::info!(person_id = %id, "person updated");
    Ok(person)
}

/// Delete a person and every quote they own. Returns the number of quotes removed.
pub fn delete_person(conn: &mut Connection, id: &str) -> ArchiveResult<usize> {
    let tx = conn.transaction()?;

    if get_person(&tx, id)?.is_none() {
        return Err(ArchiveError::PersonNotFound(id.to_string()));
    }

    let quotes_deleted = tx.execute("DELETE FROM quotes WHERE person_id = ?1", params![id])?;
    tx.execute("DELETE FROM people WHERE id = ?1", params![id])?;
    tx.commit()?;

    tracing::info!(person_id = %id, quotes_deleted, "person deleted");
    Ok(quotes_deleted)
}

/// Re-read a row inside the write transaction.
fn refresh(tx: &Transaction, id: &str) -> ArchiveResult<Person> {
    get_person(tx, id)?.ok_or_else(|| ArchiveError::PersonNotFound(id.to_string()))
}

/// Fail with [`ArchiveError::PersonAlreadyExists`] when someone other than
/// `exclude_id` already holds `value` in `field`.
fn ensure_unique(
    conn: &Connection,
    field: &'static str,
    value: Option<&str>,
    exclude_id: Option<&str>,
) -> ArchiveResult<()> {
    let Some(value) = value else {
        return Ok(());
    };
    match person_by(conn, field, value)? {
        Some(existing) if Some(existing.id.as_str()) != exclude_id => {
            Err(ArchiveError::PersonAlreadyExists {
                field,
                value: value.to_string(),
            })
        }
        _ => Ok(()),
    }
}

/// Turn a UNIQUE failure raised by SQLite itself (a concurrent writer won the
/// race) into the matching conflict error.
fn map_unique_violation(
    err: rusqlite::Error,
    platform_id: &Option<String>,
    ghost_id: &Option<String>,
    display_name: &Option<String>,
) -> ArchiveError {
    if !is_unique_violation(&err) {
        return err.into();
    }
    let message = err.to_string();
    let values = [platform_id, ghost_id, display_name];
    for (field, value) in UNIQUE_FIELDS.into_iter().zip(values) {
        if message.contains(&format!("people.{field}")) {
            return ArchiveError::PersonAlreadyExists {
                field,
                value: value.clone().unwrap_or_default(),
            };
        }
    }
    ArchiveError::PersonAlreadyExists {
        field: "platform_id",
        value: platform_id.clone().unwrap_or_default(),
    }
}
