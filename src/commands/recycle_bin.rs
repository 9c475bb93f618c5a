// Replay Keeper - Recycle Bin Commands

use crate::db::schema::{self, RecycledReplay};
use crate::error::{CatalogError, Result};
use crate::jobs::sweeper;
use super::{BatchResult, CatalogState};

pub fn list_recycle_bin(state: &CatalogState) -> Result<Vec<RecycledReplay>> {
    let conn = state.connect()?;
    schema::list_recycled(&conn)
}

pub fn restore_replays(state: &CatalogState, ufcs: &[String]) -> Result<BatchResult> {
    let conn = state.connect()?;
    Ok(BatchResult::run(ufcs, |ufc| schema::restore_replay(&conn, ufc)))
}

pub fn purge_replays(state: &CatalogState, ufcs: &[String]) -> Result<BatchResult> {
    let conn = state.connect()?;
    Ok(BatchResult::run(ufcs, |ufc| schema::purge_recycled(&conn, ufc)))
}

pub fn empty_recycle_bin(state: &CatalogState) -> Result<usize> {
    let conn = state.connect()?;
    let removed = schema::empty_recycle_bin(&conn)?;
    log::info!("Emptied recycle bin ({} replays)", removed);
    Ok(removed)
}

/// Run one retention sweep on the active catalog right away.
pub fn sweep_now(state: &CatalogState, retention_days: i64) -> Result<usize> {
    let path = state.catalog_path()?
        .ok_or_else(|| CatalogError::StorageUnavailable("No catalog open".to_string()))?;
    Ok(sweeper::run_sweep(&path, retention_days))
}
