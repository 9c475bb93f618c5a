// Replay Keeper - Tag and Find & Replace Commands

use serde::Serialize;

use crate::db::schema::{self, TextColumn};
use crate::error::Result;
use super::CatalogState;

/// Tag vocabulary of the active catalog
pub fn list_tags(state: &CatalogState) -> Result<Vec<String>> {
    let conn = state.connect()?;
    schema::list_tags(&conn)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceResult {
    pub column: TextColumn,
    pub matched: i64,
    pub changed: usize,
}

/// Number of replays a replace would touch
pub fn preview_replace(state: &CatalogState, column: TextColumn, find: &str) -> Result<i64> {
    let conn = state.connect()?;
    schema::count_matches(&conn, column, find)
}

pub fn replace_text(state: &CatalogState, column: TextColumn, find: &str, replace: &str) -> Result<ReplaceResult> {
    let conn = state.connect()?;
    let matched = schema::count_matches(&conn, column, find)?;
    let changed = schema::replace_in_column(&conn, column, find, replace)?;
    log::info!("Replaced '{}' with '{}' in {} ({} rows)", find, replace, column.column_name(), changed);
    Ok(ReplaceResult { column, matched, changed })
}
