use rusqlite::{Connection, Result};

/// Initialize media database schema
pub fn init_media_schema(conn: &Connection) -> Result<()> {
    // Schema version table for media records
    conn.execute(
        "CREATE TABLE IF NOT EXISTS media_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let current_version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM media_schema_version",
        [],
        |row| row.get(0),
    )?;

    if current_version < 1 {
        create_media_schema_v1(conn)?;
        conn.execute("INSERT INTO media_schema_version (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Create media schema version 1
fn create_media_schema_v1(conn: &Connection) -> Result<()> {
    // Records are immutable: no updated_at, no deleted flag.
    // UNIQUE(name) turns concurrent reconciliation races into clean insert failures.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS media (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            storage_path TEXT NOT NULL,
            thumbnail_path TEXT NOT NULL,
            mime_type TEXT,
            url TEXT NOT NULL,
            thumbnail_url TEXT NOT NULL,
            size_bytes INTEGER,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_media_schema(&conn).unwrap();
        init_media_schema(&conn).unwrap();

        let versions: i32 = conn
            .query_row("SELECT COUNT(*) FROM media_schema_version", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(versions, 1);

        let tables: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='media'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }
}
