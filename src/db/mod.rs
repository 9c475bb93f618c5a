// Database module
// One SQLite file per catalog, named after its catalog code (UDC).

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::{Connection, params};

use crate::constants::{
    BACKUP_TIMESTAMP_FORMAT, CATALOG_EXTENSION, CATALOG_FILE_PREFIX,
};
use crate::error::{CatalogError, Result};

/// Open an existing catalog. A missing file is `StorageUnavailable`,
/// never silently created.
pub fn open_db(db_path: &Path) -> Result<Connection> {
    if !db_path.is_file() {
        return Err(CatalogError::StorageUnavailable(db_path.display().to_string()));
    }
    open_connection(db_path)
}

fn open_connection(db_path: &Path) -> Result<Connection> {
    // Corrupt, locked or too-new files all surface as StorageUnavailable
    let unavailable = |e: &dyn std::fmt::Display| {
        CatalogError::StorageUnavailable(format!("{}: {}", db_path.display(), e))
    };

    let conn = Connection::open(db_path).map_err(|e| unavailable(&e))?;
    configure_connection(&conn).map_err(|e| unavailable(&e))?;
    migrations::run_migrations(&conn).map_err(|e| unavailable(&e))?;

    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(std::time::Duration::from_millis(5000))?;

    // Enable foreign keys (must be done per connection)
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    // WAL so the sweeper thread and foreground calls can share the file
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;

    Ok(())
}

/// File name for a catalog code
pub fn catalog_file_name(udc: &str) -> String {
    format!("{}{}.{}", CATALOG_FILE_PREFIX, udc, CATALOG_EXTENSION)
}

/// Catalog code embedded in a catalog file name, if it follows the naming scheme
pub fn catalog_code_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix(CATALOG_FILE_PREFIX)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
}

/// Create a new, empty catalog in `folder`. Returns its path and code.
pub fn create_catalog(folder: &Path) -> Result<(PathBuf, String)> {
    std::fs::create_dir_all(folder)?;

    let (path, udc) = loop {
        let udc = schema::generate_udc();
        let path = folder.join(catalog_file_name(&udc));
        if !path.exists() {
            break (path, udc);
        }
    };

    let conn = open_connection(&path)?;
    conn.execute("INSERT INTO db_info (unique_db_code) VALUES (?1)", params![udc])?;

    log::info!("Created catalog {}", path.display());
    Ok((path, udc))
}

/// Catalog files in `folder`, sorted by name. A missing folder has none.
pub fn list_catalogs(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Ok(Vec::new());
    }

    let mut catalogs = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        let is_catalog = path.is_file()
            && path.extension()
                .map(|ext| ext.eq_ignore_ascii_case(CATALOG_EXTENSION))
                .unwrap_or(false);
        if is_catalog {
            catalogs.push(path);
        }
    }
    catalogs.sort();
    Ok(catalogs)
}

/// Copy a catalog to `{stem}_{YYYYmmdd_HHMMSS}.db` in the backup folder.
pub fn backup_catalog(db_path: &Path, backup_folder: &Path, now: NaiveDateTime) -> Result<PathBuf> {
    if !db_path.is_file() {
        return Err(CatalogError::StorageUnavailable(db_path.display().to_string()));
    }

    // Fold the WAL into the main file so the copy is complete
    {
        let conn = Connection::open(db_path)?;
        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
    }

    std::fs::create_dir_all(backup_folder)?;

    let stem = db_path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| CatalogError::Validation(format!("bad catalog path {}", db_path.display())))?;
    let backup_stem = format!("{}_{}", stem, now.format(BACKUP_TIMESTAMP_FORMAT));
    let backup_path = crate::naming::resolve_collision_free_path(backup_folder, &backup_stem, CATALOG_EXTENSION);

    std::fs::copy(db_path, &backup_path)?;
    log::info!("Backed up {} to {}", db_path.display(), backup_path.display());
    Ok(backup_path)
}

/// Copy a backup into the active folder under its own file name.
/// The copy is validated on a staging file first; an existing catalog with
/// that name is only replaced once the backup is known to open.
pub fn restore_catalog(backup_path: &Path, active_folder: &Path) -> Result<PathBuf> {
    if !backup_path.is_file() {
        return Err(CatalogError::StorageUnavailable(backup_path.display().to_string()));
    }

    let file_name = backup_path.file_name()
        .ok_or_else(|| CatalogError::Validation(format!("bad backup path {}", backup_path.display())))?;

    std::fs::create_dir_all(active_folder)?;
    let dest = active_folder.join(file_name);
    let staging = dest.with_extension("db.restoring");

    let staged = std::fs::copy(backup_path, &staging)
        .map_err(CatalogError::from)
        .and_then(|_| open_db(&staging).map(drop));
    if let Err(e) = staged {
        let _ = std::fs::remove_file(&staging);
        let _ = remove_side_files(&staging);
        log::warn!("Backup {} is not a usable catalog: {}", backup_path.display(), e);
        return Err(e);
    }
    remove_side_files(&staging)?;

    // Stale WAL/SHM files would be replayed over the restored copy
    remove_side_files(&dest)?;
    std::fs::rename(&staging, &dest)?;

    log::info!("Restored {} into {}", backup_path.display(), dest.display());
    Ok(dest)
}

fn remove_side_files(db_path: &Path) -> Result<()> {
    for suffix in ["-wal", "-shm"] {
        let mut side = db_path.as_os_str().to_os_string();
        side.push(suffix);
        let side = PathBuf::from(side);
        if side.exists() {
            std::fs::remove_file(&side)?;
        }
    }
    Ok(())
}
