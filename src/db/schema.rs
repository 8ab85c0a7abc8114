//! SQL DDL for the quote archive.
//!
//! Defines the `people`, `quotes`, and `schema_meta` tables. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
-- Someone the bot has quotes for
CREATE TABLE IF NOT EXISTS people (
    id TEXT PRIMARY KEY,
    platform_id TEXT UNIQUE,
    ghost_id TEXT UNIQUE,
    display_name TEXT UNIQUE,
    first_name TEXT NOT NULL CHECK(length(first_name) > 0),
    last_name TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK(platform_id IS NOT NULL OR ghost_id IS NOT NULL)
);

CREATE INDEX IF NOT EXISTS idx_people_first_name ON people(first_name COLLATE NOCASE);

-- Something a person said. content_key is the lowercased content and backs the
-- per-person case-insensitive uniqueness rule.
CREATE TABLE IF NOT EXISTS quotes (
    id TEXT PRIMARY KEY,
    person_id TEXT NOT NULL REFERENCES people(id) ON DELETE CASCADE,
    content TEXT NOT NULL CHECK(length(content) > 0),
    content_key TEXT NOT NULL,
    created TEXT NOT NULL,
    UNIQUE(person_id, content_key)
);

CREATE INDEX IF NOT EXISTS idx_quotes_person ON quotes(person_id);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"people".to_string()));
        assert!(tables.contains(&"quotes".to_string()));
        assert!(tables.contains(&"schema_meta".to_string()));
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap(); // second call should not error
    }

    #[test]
    fn person_needs_platform_or_ghost_id() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO people (id, first_name, created_at, updated_at) VALUES ('p1', 'Kai', 'now', 'now')",
            [],
        );
        assert!(result.is_err());
    }
}
