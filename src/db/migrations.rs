// Database migrations
// Migrations are forward-only. Never edit or delete a migration after it ships.
// Migration 1 uses IF NOT EXISTS so catalogs created before versioning (user_version 0)
// adopt the schema without losing rows.

use rusqlite::Connection;
use anyhow::Result;

/// All migrations in order. Each migration is a SQL string.
const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    -- Active replays
    CREATE TABLE IF NOT EXISTS replays (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        video_link TEXT,
        file_name TEXT,
        timestamp TEXT,
        ufc TEXT UNIQUE,
        extended_desc TEXT,
        recorded INTEGER,
        renamed_filename TEXT,
        date_added TEXT,
        tags TEXT
    );

    -- Recycle bin (soft-deleted replays)
    CREATE TABLE IF NOT EXISTS recycle_bin (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        video_link TEXT,
        file_name TEXT,
        timestamp TEXT,
        ufc TEXT UNIQUE,
        extended_desc TEXT,
        recorded INTEGER,
        renamed_filename TEXT,
        date_added TEXT,
        deleted_date TEXT,
        tags TEXT
    );

    -- Catalog identity (single row)
    CREATE TABLE IF NOT EXISTS db_info (
        unique_db_code TEXT UNIQUE
    );
    "#,

    // Migration 2: Indexes for recycle bin sweeps
    r#"
    CREATE INDEX IF NOT EXISTS idx_recycle_bin_deleted_date ON recycle_bin(deleted_date);
    "#,
];

/// Get current schema version from database
fn get_schema_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row(
        "PRAGMA user_version",
        [],
        |row| row.get(0)
    )?;
    Ok(version)
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    let target_version = MIGRATIONS.len() as u32;

    // Refuse to open a catalog created by a newer build
    if current_version > target_version {
        anyhow::bail!(
            "Catalog schema version {} is newer than this build supports (max {}). Please upgrade Replay Keeper.",
            current_version,
            target_version
        );
    }

    if current_version == target_version {
        return Ok(());
    }

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as u32;
        if migration_version <= current_version {
            continue;
        }

        conn.execute_batch(migration)?;
        conn.execute_batch(&format!("PRAGMA user_version = {}", migration_version))?;

        log::info!("Applied catalog migration {}", migration_version);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_legacy_catalog_keeps_rows() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(r#"
            CREATE TABLE replays (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                video_link TEXT, file_name TEXT, timestamp TEXT, ufc TEXT UNIQUE,
                extended_desc TEXT, recorded INTEGER, renamed_filename TEXT,
                date_added TEXT, tags TEXT
            );
            INSERT INTO replays (file_name, ufc, recorded) VALUES ('old', 'UFC-AAAA', 0);
        "#).unwrap();

        run_migrations(&conn).unwrap();

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM replays", [], |row| row.get(0)).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA user_version = 99").unwrap();
        assert!(run_migrations(&conn).is_err());
    }
}
