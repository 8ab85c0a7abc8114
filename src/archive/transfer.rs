//! Bulk import and export of the archive.
//!
//! The file format is a JSON array of people, each carrying the text of their
//! quotes. Export output can be fed straight back into import.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::person::{all_people, create_person, person_by_display_name, person_by_ghost_id, person_by_platform_id};
use super::quote::{create_quote, quotes_for_person};
use super::types::{NewPerson, Person};
use crate::error::{ArchiveError, ArchiveResult};

/// One person and their quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ghost_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub quotes: Vec<String>,
}

/// Counts reported after an import.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub people_created: u64,
    pub people_reused: u64,
    pub quotes_imported: u64,
    /// Quotes the person already had.
    pub quotes_skipped: u64,
    /// Entries or quotes that could not be stored, with the reason.
    pub failures: Vec<String>,
}

/// Find the stored person an entry refers to, by any of its identifiers.
fn existing_person(conn: &Connection, entry: &ArchiveEntry) -> ArchiveResult<Option<Person>> {
    if let Some(id) = &entry.platform_id {
        if let Some(person) = person_by_platform_id(conn, id)? {
            return Ok(Some(person));
        }
    }
    if let Some(id) = &entry.ghost_id {
        if let Some(person) = person_by_ghost_id(conn, id)? {
            return Ok(Some(person));
        }
    }
    if let Some(name) = &entry.display_name {
        if let Some(person) = person_by_display_name(conn, name)? {
            return Ok(Some(person));
        }
    }
    Ok(None)
}

/// Import entries. Existing people are reused and duplicate quotes skipped.
///
/// Bad entries are recorded in [`ImportSummary::failures`] and do not stop the
/// import; storage failures do. `on_entry` is called after each entry.
pub fn import_entries(
    conn: &mut Connection,
    entries: &[ArchiveEntry],
    mut on_entry: impl FnMut(),
) -> ArchiveResult<ImportSummary> {
    let mut summary = ImportSummary::default();

    for entry in entries {
        let person = match existing_person(conn, entry)? {
            Some(person) => {
                summary.people_reused += 1;
                person
            }
            None => {
                let new = NewPerson {
                    platform_id: entry.platform_id.clone(),
                    ghost_id: entry.ghost_id.clone(),
                    display_name: entry.display_name.clone(),
                    first_name: entry.first_name.clone(),
                    last_name: entry.last_name.clone(),
                };
                match create_person(conn, &new) {
                    Ok(person) => {
                        summary.people_created += 1;
                        person
                    }
                    Err(e @ (ArchiveError::EmptyRequiredField(_) | ArchiveError::PersonAlreadyExists { .. })) => {
                        summary.failures.push(format!("{}: {e}", entry.first_name));
                        on_entry();
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        for content in &entry.quotes {
            match create_quote(conn, &person.id, content) {
                Ok(_) => summary.quotes_imported += 1,
                Err(ArchiveError::QuoteAlreadyExists) => summary.quotes_skipped += 1,
                Err(e @ ArchiveError::EmptyRequiredField(_)) => {
                    summary.failures.push(format!("{}: {e}", person.first_name));
                }
                Err(e) => return Err(e),
            }
        }
        on_entry();
    }

    tracing::info!(
        people_created = summary.people_created,
        quotes_imported = summary.quotes_imported,
        quotes_skipped = summary.quotes_skipped,
        "import finished"
    );
    Ok(summary)
}

/// Everyone in the archive with their quotes, oldest quote first.
pub fn export_entries(conn: &Connection) -> ArchiveResult<Vec<ArchiveEntry>> {
    all_people(conn)?
        .into_iter()
        .map(|person| {
            let quotes = quotes_for_person(conn, &person.id)?
                .into_iter()
                .map(|q| q.content)
                .collect();
            Ok(ArchiveEntry {
                platform_id: person.platform_id,
                ghost_id: person.ghost_id,
                display_name: person.display_name,
                first_name: person.first_name,
                last_name: person.last_name,
                quotes,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::quote::count_quotes;
    use crate::db::open_memory_database;

    fn entry(ghost: &str, quotes: &[&str]) -> ArchiveEntry {
        ArchiveEntry {
            platform_id: None,
            ghost_id: Some(ghost.into()),
            display_name: None,
            first_name: ghost.into(),
            last_name: None,
            quotes: quotes.iter().map(|q| q.to_string()).collect(),
        }
    }

    #[test]
    fn import_reuses_people_and_skips_duplicates() {
        let mut conn = open_memory_database().unwrap();
        let first = import_entries(&mut conn, &[entry("jeff", &["a", "b"])], || {}).unwrap();
        assert_eq!(first.people_created, 1);
        assert_eq!(first.quotes_imported, 2);

        let second = import_entries(&mut conn, &[entry("jeff", &["A", "c"])], || {}).unwrap();
        assert_eq!(second.people_created, 0);
        assert_eq!(second.people_reused, 1);
        assert_eq!(second.quotes_imported, 1);
        assert_eq!(second.quotes_skipped, 1);

        let jeff = person_by_ghost_id(&conn, "jeff").unwrap().unwrap();
        assert_eq!(count_quotes(&conn, &jeff.id).unwrap(), 3);
    }

    #[test]
    fn bad_entries_are_reported_not_fatal() {
        let mut conn = open_memory_database().unwrap();
        let nameless = ArchiveEntry {
            first_name: String::new(),
            ..entry("ghost", &["x"])
        };
        let mut seen = 0;
        let summary =
            import_entries(&mut conn, &[nameless, entry("kelly", &["y"])], || seen += 1).unwrap();
        assert_eq!(seen, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.people_created, 1);
    }

    #[test]
    fn export_matches_import_format() {
        let mut conn = open_memory_database().unwrap();
        import_entries(&mut conn, &[entry("jeff", &["first", "second"])], || {}).unwrap();

        let exported = export_entries(&conn).unwrap();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].ghost_id.as_deref(), Some("jeff"));
        // ghost display name defaults to the ghost id
        assert_eq!(exported[0].display_name.as_deref(), Some("jeff"));
        assert_eq!(exported[0].quotes, vec!["first", "second"]);
    }
}
