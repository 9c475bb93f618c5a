// Database schema types and query helpers
// Two collections: `replays` (active) and `recycle_bin` (soft-deleted).
// A UFC lives in exactly one of them; moves between them are single transactions.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DATE_FORMAT, LEGACY_DATE_FORMAT, UDC_LENGTH, UFC_LENGTH, UFC_PREFIX,
};
use crate::error::{CatalogError, Result};

const REPLAY_COLUMNS: &str =
    "id, ufc, file_name, renamed_filename, timestamp, video_link, extended_desc, tags, recorded, date_added";

// Column list shared by both tables for row moves (id handled separately)
const MOVE_COLUMNS: &str =
    "video_link, file_name, timestamp, ufc, extended_desc, recorded, renamed_filename, date_added, tags";

// ----- Replay -----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    pub id: i64,
    pub ufc: String,
    pub file_name: String,
    pub renamed_filename: Option<String>,
    pub timestamp: String,
    pub video_link: String,
    pub extended_desc: String,
    pub tags: String,
    pub recorded: bool,
    pub date_added: String,
}

impl Replay {
    /// Tags as a list (split on commas, trimmed, empties dropped)
    pub fn tag_list(&self) -> Vec<String> {
        parse_tags(&self.tags)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecycledReplay {
    #[serde(flatten)]
    pub replay: Replay,
    pub deleted_date: String,
}

/// Caller-supplied fields for a new replay
#[derive(Debug, Clone, Default)]
pub struct NewReplay {
    pub file_name: String,
    pub timestamp: String,
    pub video_link: String,
    pub extended_desc: String,
    pub tags: String,
}

/// Partial update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayUpdate {
    pub file_name: Option<String>,
    pub timestamp: Option<String>,
    pub video_link: Option<String>,
    pub extended_desc: Option<String>,
    pub recorded: Option<bool>,
    pub tags: Option<String>,
    pub renamed_filename: Option<String>,
}

impl ReplayUpdate {
    pub fn is_empty(&self) -> bool {
        self.file_name.is_none()
            && self.timestamp.is_none()
            && self.video_link.is_none()
            && self.extended_desc.is_none()
            && self.recorded.is_none()
            && self.tags.is_none()
            && self.renamed_filename.is_none()
    }
}

fn map_replay(row: &rusqlite::Row) -> rusqlite::Result<Replay> {
    // Catalogs from older builds may hold NULLs in any text column
    Ok(Replay {
        id: row.get(0)?,
        ufc: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        file_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        renamed_filename: row.get(3)?,
        timestamp: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        video_link: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        extended_desc: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        tags: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        recorded: row.get::<_, Option<i64>>(8)?.unwrap_or(0) != 0,
        date_added: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
    })
}

fn map_recycled(row: &rusqlite::Row) -> rusqlite::Result<RecycledReplay> {
    Ok(RecycledReplay {
        replay: map_replay(row)?,
        deleted_date: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
    })
}

// ----- Tags -----

/// Split a comma-joined tag string into trimmed, non-empty tags.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join tags back into the stored form.
pub fn join_tags<S: AsRef<str>>(tags: &[S]) -> String {
    tags.iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Sorted, deduplicated tag vocabulary across all active replays.
pub fn list_tags(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT tags FROM replays WHERE tags IS NOT NULL AND tags != ''"
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let tags: BTreeSet<String> = rows.iter().flat_map(|raw| parse_tags(raw)).collect();
    Ok(tags.into_iter().collect())
}

// ----- Identifiers -----

/// New unique file code, e.g. `UFC-3F9A`
pub fn generate_ufc() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", UFC_PREFIX, uuid[..UFC_LENGTH].to_uppercase())
}

/// New unique catalog code, e.g. `7C1D09AB`
pub fn generate_udc() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    uuid[..UDC_LENGTH].to_uppercase()
}

/// True if the UFC is taken in either collection
pub fn ufc_exists(conn: &Connection, ufc: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM replays WHERE ufc = ?1)
             OR EXISTS(SELECT 1 FROM recycle_bin WHERE ufc = ?1)",
        params![ufc],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Catalog code from `db_info`, created on first access.
pub fn get_or_create_catalog_code(conn: &Connection) -> Result<String> {
    let existing: Option<String> = conn.query_row(
        "SELECT unique_db_code FROM db_info LIMIT 1",
        [],
        |row| row.get(0),
    ).optional()?;

    if let Some(code) = existing {
        return Ok(code);
    }

    let code = generate_udc();
    conn.execute("INSERT INTO db_info (unique_db_code) VALUES (?1)", params![code])?;
    log::info!("Assigned catalog code UDC-{}", code);
    Ok(code)
}

// ----- Dates -----

pub fn format_catalog_date(at: NaiveDateTime) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// Parse a stored date in the current or legacy format.
pub fn parse_catalog_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, LEGACY_DATE_FORMAT))
        .ok()
}

fn now_local() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// UNIQUE failures only; NOT NULL, CHECK and other constraints are real errors.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// ----- Active replays -----

/// Insert a replay under a caller-chosen UFC.
/// Fails with `DuplicateIdentifier` if the code is taken in either collection.
pub fn insert_replay(conn: &Connection, ufc: &str, fields: &NewReplay) -> Result<Replay> {
    if ufc_exists(conn, ufc)? {
        return Err(CatalogError::DuplicateIdentifier(ufc.to_string()));
    }

    let date_added = format_catalog_date(now_local());
    conn.execute(
        "INSERT INTO replays (video_link, file_name, timestamp, ufc, extended_desc, recorded, date_added, tags)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7)",
        params![
            fields.video_link,
            fields.file_name,
            fields.timestamp,
            ufc,
            fields.extended_desc,
            date_added,
            fields.tags,
        ],
    ).map_err(|e| {
        if is_unique_violation(&e) {
            CatalogError::DuplicateIdentifier(ufc.to_string())
        } else {
            CatalogError::Database(e)
        }
    })?;

    Ok(Replay {
        id: conn.last_insert_rowid(),
        ufc: ufc.to_string(),
        file_name: fields.file_name.clone(),
        renamed_filename: None,
        timestamp: fields.timestamp.clone(),
        video_link: fields.video_link.clone(),
        extended_desc: fields.extended_desc.clone(),
        tags: fields.tags.clone(),
        recorded: false,
        date_added,
    })
}

/// Insert a replay under a freshly generated UFC and return the code.
pub fn create_replay(conn: &Connection, fields: &NewReplay) -> Result<String> {
    let ufc = generate_ufc();
    insert_replay(conn, &ufc, fields)?;
    Ok(ufc)
}

/// All active replays in insertion order
pub fn list_replays(conn: &Connection) -> Result<Vec<Replay>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM replays ORDER BY id ASC",
        REPLAY_COLUMNS
    ))?;
    let replays = stmt.query_map([], map_replay)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(replays)
}

pub fn get_replay(conn: &Connection, ufc: &str) -> Result<Option<Replay>> {
    let result = conn.query_row(
        &format!("SELECT {} FROM replays WHERE ufc = ?1", REPLAY_COLUMNS),
        params![ufc],
        map_replay,
    ).optional()?;
    Ok(result)
}

pub fn count_replays(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM replays", [], |row| row.get(0))?;
    Ok(count)
}

/// Apply a partial update. An empty update is a no-op.
pub fn update_replay(conn: &Connection, ufc: &str, updates: &ReplayUpdate) -> Result<()> {
    if updates.is_empty() {
        return Ok(());
    }

    let mut set_clauses: Vec<String> = Vec::new();
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(ref file_name) = updates.file_name {
        set_clauses.push(format!("file_name = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(file_name.clone()));
    }
    if let Some(ref timestamp) = updates.timestamp {
        set_clauses.push(format!("timestamp = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(timestamp.clone()));
    }
    if let Some(ref video_link) = updates.video_link {
        set_clauses.push(format!("video_link = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(video_link.clone()));
    }
    if let Some(ref desc) = updates.extended_desc {
        set_clauses.push(format!("extended_desc = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(desc.clone()));
    }
    if let Some(recorded) = updates.recorded {
        set_clauses.push(format!("recorded = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(recorded as i64));
    }
    if let Some(ref tags) = updates.tags {
        set_clauses.push(format!("tags = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(tags.clone()));
    }
    if let Some(ref renamed) = updates.renamed_filename {
        set_clauses.push(format!("renamed_filename = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(renamed.clone()));
    }

    params_vec.push(Box::new(ufc.to_string()));
    let ufc_param = params_vec.len();

    let sql = format!(
        "UPDATE replays SET {} WHERE ufc = ?{}",
        set_clauses.join(", "),
        ufc_param
    );

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let changed = conn.execute(&sql, params_refs.as_slice())?;
    if changed == 0 {
        return Err(CatalogError::NotFound(ufc.to_string()));
    }
    Ok(())
}

/// Remove an active replay without passing through the recycle bin.
pub fn delete_replay_permanently(conn: &Connection, ufc: &str) -> Result<()> {
    let removed = conn.execute("DELETE FROM replays WHERE ufc = ?1", params![ufc])?;
    if removed == 0 {
        return Err(CatalogError::NotFound(ufc.to_string()));
    }
    Ok(())
}

// ----- Recycle bin -----

/// Move an active replay to the recycle bin, stamped now.
pub fn soft_delete_replay(conn: &Connection, ufc: &str) -> Result<()> {
    soft_delete_replay_at(conn, ufc, now_local())
}

/// Move an active replay to the recycle bin with an explicit deletion time.
pub fn soft_delete_replay_at(conn: &Connection, ufc: &str, deleted_at: NaiveDateTime) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    // Keep the row id unless the bin already holds that id (rows from older builds)
    let moved = tx.execute(
        &format!(
            "INSERT INTO recycle_bin (id, {cols}, deleted_date)
             SELECT CASE WHEN EXISTS(SELECT 1 FROM recycle_bin b WHERE b.id = r.id) THEN NULL ELSE r.id END,
                    {cols}, ?2
             FROM replays r WHERE r.ufc = ?1",
            cols = MOVE_COLUMNS
        ),
        params![ufc, format_catalog_date(deleted_at)],
    )?;

    if moved == 0 {
        return Err(CatalogError::NotFound(ufc.to_string()));
    }

    tx.execute("DELETE FROM replays WHERE ufc = ?1", params![ufc])?;
    tx.commit()?;
    Ok(())
}

/// Move a recycled replay back to the active collection.
pub fn restore_replay(conn: &Connection, ufc: &str) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    let already_active: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM replays WHERE ufc = ?1)",
        params![ufc],
        |row| row.get(0),
    )?;
    if already_active {
        return Err(CatalogError::DuplicateIdentifier(ufc.to_string()));
    }

    let moved = tx.execute(
        &format!(
            "INSERT INTO replays (id, {cols})
             SELECT CASE WHEN EXISTS(SELECT 1 FROM replays a WHERE a.id = b.id) THEN NULL ELSE b.id END,
                    {cols}
             FROM recycle_bin b WHERE b.ufc = ?1",
            cols = MOVE_COLUMNS
        ),
        params![ufc],
    )?;

    if moved == 0 {
        return Err(CatalogError::NotFound(ufc.to_string()));
    }

    tx.execute("DELETE FROM recycle_bin WHERE ufc = ?1", params![ufc])?;
    tx.commit()?;
    Ok(())
}

pub fn get_recycled(conn: &Connection, ufc: &str) -> Result<Option<RecycledReplay>> {
    let result = conn.query_row(
        &format!("SELECT {}, deleted_date FROM recycle_bin WHERE ufc = ?1", REPLAY_COLUMNS),
        params![ufc],
        map_recycled,
    ).optional()?;
    Ok(result)
}

pub fn list_recycled(conn: &Connection) -> Result<Vec<RecycledReplay>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {}, deleted_date FROM recycle_bin ORDER BY id ASC",
        REPLAY_COLUMNS
    ))?;
    let items = stmt.query_map([], map_recycled)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(items)
}

pub fn count_recycled(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM recycle_bin", [], |row| row.get(0))?;
    Ok(count)
}

/// Permanently remove one recycled replay.
pub fn purge_recycled(conn: &Connection, ufc: &str) -> Result<()> {
    let removed = conn.execute("DELETE FROM recycle_bin WHERE ufc = ?1", params![ufc])?;
    if removed == 0 {
        return Err(CatalogError::NotFound(ufc.to_string()));
    }
    Ok(())
}

/// Permanently remove everything in the recycle bin.
pub fn empty_recycle_bin(conn: &Connection) -> Result<usize> {
    let removed = conn.execute("DELETE FROM recycle_bin", [])?;
    Ok(removed)
}

/// Remove recycled replays deleted strictly before `now - retention_days`.
/// Dates are compared as parsed values so legacy `MM-DD-YYYY` stamps sweep correctly.
pub fn purge_expired(conn: &Connection, retention_days: i64, now: NaiveDateTime) -> Result<usize> {
    let cutoff = now - chrono::Duration::days(retention_days);

    let mut stmt = conn.prepare("SELECT id, deleted_date FROM recycle_bin")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?))
    })?.collect::<std::result::Result<Vec<_>, _>>()?;
    drop(stmt);

    let mut expired = Vec::new();
    for (id, deleted_date) in rows {
        let raw = deleted_date.unwrap_or_default();
        match parse_catalog_date(&raw) {
            Some(deleted_at) if deleted_at < cutoff => expired.push(id),
            Some(_) => {}
            None => log::warn!("Recycle bin row {} has unreadable deleted_date '{}'; skipping", id, raw),
        }
    }

    if expired.is_empty() {
        return Ok(0);
    }

    let tx = conn.unchecked_transaction()?;
    {
        let mut delete = tx.prepare("DELETE FROM recycle_bin WHERE id = ?1")?;
        for id in &expired {
            delete.execute(params![id])?;
        }
    }
    tx.commit()?;

    Ok(expired.len())
}

// ----- Find & replace -----

/// Editable text columns eligible for find & replace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextColumn {
    FileName,
    Timestamp,
    VideoLink,
    Description,
    Tags,
}

impl TextColumn {
    pub fn column_name(&self) -> &'static str {
        match self {
            TextColumn::FileName => "file_name",
            TextColumn::Timestamp => "timestamp",
            TextColumn::VideoLink => "video_link",
            TextColumn::Description => "extended_desc",
            TextColumn::Tags => "tags",
        }
    }
}

impl FromStr for TextColumn {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "file_name" | "filename" => Ok(TextColumn::FileName),
            "timestamp" => Ok(TextColumn::Timestamp),
            "video_link" | "link" => Ok(TextColumn::VideoLink),
            "description" | "extended_desc" => Ok(TextColumn::Description),
            "tags" => Ok(TextColumn::Tags),
            other => Err(format!("unknown column '{}'", other)),
        }
    }
}

/// Number of active replays whose column contains `find` (case-sensitive, like REPLACE).
pub fn count_matches(conn: &Connection, column: TextColumn, find: &str) -> Result<i64> {
    if find.is_empty() {
        return Err(CatalogError::Validation("find text is empty".to_string()));
    }
    let col = column.column_name();
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM replays WHERE instr({col}, ?1) > 0"),
        params![find],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Replace every occurrence of `find` in the column; returns rows changed.
pub fn replace_in_column(conn: &Connection, column: TextColumn, find: &str, replace: &str) -> Result<usize> {
    if find.is_empty() {
        return Err(CatalogError::Validation("find text is empty".to_string()));
    }
    let col = column.column_name();
    let changed = conn.execute(
        &format!("UPDATE replays SET {col} = REPLACE({col}, ?1, ?2) WHERE instr({col}, ?1) > 0"),
        params![find, replace],
    )?;
    Ok(changed)
}
