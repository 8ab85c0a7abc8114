//! Quote storage and random sampling.
//!
//! A person never holds two quotes that differ only in letter case. The
//! `content_key` column (Unicode-lowercased content) enforces that in SQLite as
//! well, so a racing writer gets [`ArchiveError::QuoteAlreadyExists`] too.

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

use super::person::get_person;
use super::types::{Person, Quote, QuoteUpdate};
use crate::error::{is_unique_violation, ArchiveError, ArchiveResult};

const QUOTE_COLUMNS: &str = "id, person_id, content, created";

fn quote_from_row(row: &Row<'_>) -> rusqlite::Result<Quote> {
    Ok(Quote {
        id: row.get(0)?,
        person_id: row.get(1)?,
        content: row.get(2)?,
        created: row.get(3)?,
    })
}

/// Key used for case-insensitive comparison of quote content.
pub fn content_key(content: &str) -> String {
    content.to_lowercase()
}

pub fn get_quote(conn: &Connection, id: &str) -> ArchiveResult<Option<Quote>> {
    let sql = format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], quote_from_row).optional()?)
}

/// A quote only if it belongs to `person_id`.
pub fn quote_for_person(
    conn: &Connection,
    person_id: &str,
    quote_id: &str,
) -> ArchiveResult<Option<Quote>> {
    let sql = format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = ?1 AND person_id = ?2");
    Ok(conn
        .query_row(&sql, params![quote_id, person_id], quote_from_row)
        .optional()?)
}

/// All of a person's quotes, oldest first.
pub fn quotes_for_person(conn: &Connection, person_id: &str) -> ArchiveResult<Vec<Quote>> {
    let sql = format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE person_id = ?1 ORDER BY created, id");
    let mut stmt = conn.prepare(&sql)?;
    let quotes = stmt
        .query_map(params![person_id], quote_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(quotes)
}

/// Up to `n` distinct quotes of one person, sampled without replacement.
pub fn random_quotes_for_person(
    conn: &Connection,
    person_id: &str,
    n: usize,
) -> ArchiveResult<Vec<Quote>> {
    let sql = format!(
        "SELECT {QUOTE_COLUMNS} FROM quotes WHERE person_id = ?1 ORDER BY RANDOM() LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let quotes = stmt
        .query_map(params![person_id, n as i64], quote_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(quotes)
}

/// One quote drawn uniformly from the whole archive, with its owner.
///
/// Sampling is over quotes, not people, so prolific people are not
/// under-represented.
pub fn random_quote_any_person(conn: &Connection) -> ArchiveResult<Option<(Quote, Person)>> {
    let quote = conn
        .query_row(
            &format!("SELECT {QUOTE_COLUMNS} FROM quotes ORDER BY RANDOM() LIMIT 1"),
            [],
            quote_from_row,
        )
        .optional()?;

    let Some(quote) = quote else {
        return Ok(None);
    };
    let owner = get_person(conn, &quote.person_id)?
        .ok_or_else(|| ArchiveError::PersonNotFound(quote.person_id.clone()))?;
    Ok(Some((quote, owner)))
}

pub fn has_any_quotes(conn: &Connection) -> ArchiveResult<bool> {
    Ok(conn.query_row("SELECT EXISTS(SELECT 1 FROM quotes)", [], |row| row.get(0))?)
}

pub fn count_quotes(conn: &Connection, person_id: &str) -> ArchiveResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM quotes WHERE person_id = ?1",
        params![person_id],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Whether a person already has a quote with this content, ignoring case.
pub fn has_said(conn: &Connection, person_id: &str, content: &str) -> ArchiveResult<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM quotes WHERE person_id = ?1 AND content_key = ?2)",
        params![person_id, content_key(content)],
        |row| row.get(0),
    )?)
}

/// Add a quote to an existing person.
///
/// The caller must make sure the person exists; this never creates one.
pub fn create_quote(conn: &mut Connection, person_id: &str, content: &str) -> ArchiveResult<Quote> {
    let mut missing = Vec::new();
    if person_id.trim().is_empty() {
        missing.push("person_id");
    }
    if content.trim().is_empty() {
        missing.push("content");
    }
    if !missing.is_empty() {
        return Err(ArchiveError::empty_fields(&missing));
    }

    let tx = conn.transaction()?;

    if get_person(&tx, person_id)?.is_none() {
        return Err(ArchiveError::PersonNotFound(person_id.to_string()));
    }
    if has_said(&tx, person_id, content)? {
        return Err(ArchiveError::QuoteAlreadyExists);
    }

    let id = uuid::Uuid::now_v7().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    tx.execute(
        "INSERT INTO quotes (id, person_id, content, content_key, created) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, person_id, content, content_key(content), now],
    )
    .map_err(map_unique_violation)?;

    let quote = refresh(&tx, &id)?;
    tx.commit()?;

    tracing::info!(quote_id = %quote.id, person_id = %person_id, "quote created");
    Ok(quote)
}

/// Edit a quote's content and/or move it to another person.
///
/// Uniqueness is re-checked against the *new* owner. `created` is kept.
pub fn update_quote(conn: &mut Connection, id: &str, update: &QuoteUpdate) -> ArchiveResult<Quote> {
    let tx = conn.transaction()?;

    let current = get_quote(&tx, id)?.ok_or_else(|| ArchiveError::QuoteNotFound(id.to_string()))?;

    let person_id = update.person_id.clone().unwrap_or_else(|| current.person_id.clone());
    let content = update.content.clone().unwrap_or_else(|| current.content.clone());

    if content.trim().is_empty() {
        return Err(ArchiveError::empty_fields(&["content"]));
    }
    if get_person(&tx, &person_id)?.is_none() {
        return Err(ArchiveError::PersonNotFound(person_id));
    }

    let clash: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM quotes WHERE person_id = ?1 AND content_key = ?2 AND id != ?3)",
        params![person_id, content_key(&content), id],
        |row| row.get(0),
    )?;
    if clash {
        return Err(ArchiveError::QuoteAlreadyExists);
    }

    tx.execute(
        "UPDATE quotes SET person_id = ?1, content = ?2, content_key = ?3 WHERE id = ?4",
        params![person_id, content, content_key(&content), id],
    )
    .map_err(map_unique_violation)?;

    let quote = refresh(&tx, id)?;
    tx.commit()?;

    tracing::info!(quote_id = %id, person_id = %quote.person_id, "quote updated");
    Ok(quote)
}

pub fn delete_quote(conn: &mut Connection, id: &str) -> ArchiveResult<()> {
    let tx = conn.transaction()?;
    let rows = tx.execute("DELETE FROM quotes WHERE id = ?1", params![id])?;
    if rows == 0 {
        return Err(ArchiveError::QuoteNotFound(id.to_string()));
    }
    tx.commit()?;

    tracing::info!(quote_id = %id, "quote deleted");
    Ok(())
}

fn refresh(tx: &Transaction, id: &str) -> ArchiveResult<Quote> {
    get_quote(tx, id)?.ok_or_else(|| ArchiveError::QuoteNotFound(id.to_string()))
}

fn map_unique_violation(err: rusqlite::Error) -> ArchiveError {
    if is_unique_violation(&err) {
        ArchiveError::QuoteAlreadyExists
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::person::{create_person, delete_person};
    use crate::archive::types::NewPerson;
    use crate::db::open_memory_database;

    fn setup() -> (Connection, Person) {
        let mut conn = open_memory_database().unwrap();
        let person = create_person(&mut conn, &NewPerson::platform("U1", "Kai")).unwrap();
        (conn, person)
    }

    #[test]
    fn test_create_quote() {
        let (mut conn, person) = setup();
        assert_eq!(count_quotes(&conn, &person.id).unwrap(), 0);

        let content = "My face always looks like such a tomato.";
        let quote = create_quote(&mut conn, &person.id, content).unwrap();
        assert_eq!(quote.content, content);
        assert_eq!(quote.person_id, person.id);
        assert!(!quote.created.is_empty());

        assert_eq!(count_quotes(&conn, &person.id).unwrap(), 1);
        assert!(has_said(&conn, &person.id, content).unwrap());
        assert!(has_any_quotes(&conn).unwrap());
    }

    #[test]
    fn test_duplicate_content_ignores_case() {
        let (mut conn, person) = setup();
        create_quote(&mut conn, &person.id, "Ça va bien").unwrap();

        let err = create_quote(&mut conn, &person.id, "ÇA VA BIEN").unwrap_err();
        assert!(matches!(err, ArchiveError::QuoteAlreadyExists));
        assert_eq!(count_quotes(&conn, &person.id).unwrap(), 1);
    }

    #[test]
    fn test_same_content_for_different_people() {
        let (mut conn, kai) = setup();
        let jamie = create_person(&mut conn, &NewPerson::platform("U2", "Jamie")).unwrap();

        create_quote(&mut conn, &kai.id, "ship it").unwrap();
        create_quote(&mut conn, &jamie.id, "ship it").unwrap();
    }

    #[test]
    fn test_create_quote_for_missing_person() {
        let mut conn = open_memory_database().unwrap();
        let err = create_quote(&mut conn, "nonexistent", "Should not be saved!").unwrap_err();
        assert!(matches!(err, ArchiveError::PersonNotFound(_)));
    }

    #[test]
    fn test_create_quote_requires_fields() {
        let mut conn = open_memory_database().unwrap();
        let err = create_quote(&mut conn, "", "  ").unwrap_err();
        match err {
            ArchiveError::EmptyRequiredField(fields) => assert_eq!(fields, "person_id, content"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_update_quote_revalidates_against_new_owner() {
        let (mut conn, kai) = setup();
        let jamie = create_person(&mut conn, &NewPerson::platform("U2", "Jamie")).unwrap();

        let moving = create_quote(&mut conn, &kai.id, "Hello there").unwrap();
        create_quote(&mut conn, &jamie.id, "hello THERE").unwrap();

        let err = update_quote(
            &mut conn,
            &moving.id,
            &QuoteUpdate {
                person_id: Some(jamie.id.clone()),
                content: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ArchiveError::QuoteAlreadyExists));

        let edited = update_quote(
            &mut conn,
            &moving.id,
            &QuoteUpdate {
                person_id: Some(jamie.id.clone()),
                content: Some("General Kenobi".into()),
            },
        )
        .unwrap();
        assert_eq!(edited.person_id, jamie.id);
        assert_eq!(edited.content, "General Kenobi");
        assert_eq!(edited.created, moving.created);
    }

    #[test]
    fn test_update_quote_case_change_of_itself() {
        let (mut conn, kai) = setup();
        let quote = create_quote(&mut conn, &kai.id, "hello").unwrap();

        let edited = update_quote(
            &mut conn,
            &quote.id,
            &QuoteUpdate {
                content: Some("Hello".into()),
                person_id: None,
            },
        )
        .unwrap();
        assert_eq!(edited.content, "Hello");
    }

    #[test]
    fn test_random_sampling() {
        let (mut conn, kai) = setup();
        assert!(random_quote_any_person(&conn).unwrap().is_none());

        for content in ["a", "b", "c"] {
            create_quote(&mut conn, &kai.id, content).unwrap();
        }

        let sample = random_quotes_for_person(&conn, &kai.id, 2).unwrap();
        assert_eq!(sample.len(), 2);
        assert_ne!(sample[0].id, sample[1].id);

        let sample = random_quotes_for_person(&conn, &kai.id, 10).unwrap();
        assert_eq!(sample.len(), 3);

        let (quote, owner) = random_quote_any_person(&conn).unwrap().unwrap();
        assert_eq!(owner.id, kai.id);
        assert!(["a", "b", "c"].contains(&quote.content.as_str()));
    }

    #[test]
    fn test_delete_person_cascades_quotes() {
        let (mut conn, kai) = setup();
        let quote = create_quote(&mut conn, &kai.id, "bye").unwrap();

        let removed = delete_person(&mut conn, &kai.id).unwrap();
        assert_eq!(removed, 1);
        assert!(get_quote(&conn, &quote.id).unwrap().is_none());
        assert!(!has_any_quotes(&conn).unwrap());
    }

    #[test]
    fn test_delete_quote() {
        let (mut conn, kai) = setup();
        let quote = create_quote(&mut conn, &kai.id, "gone").unwrap();

        delete_quote(&mut conn, &quote.id).unwrap();
        assert!(get_quote(&conn, &quote.id).unwrap().is_none());

        let err = delete_quote(&mut conn, &quote.id).unwrap_err();
        assert!(matches!(err, ArchiveError::QuoteNotFound(_)));
    }
}
