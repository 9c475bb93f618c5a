// Replay Keeper - Catalog Commands
// Open, switch, create, close, back up and restore catalog files

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::db::{self, schema};
use crate::error::Result;
use crate::preferences::PreferenceStore;
use super::CatalogState;

/// Catalog info returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogInfo {
    pub path: String,
    pub udc: String,
    pub replay_count: i64,
    pub recycled_count: i64,
}

/// One catalog file in the active folder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogListing {
    pub path: String,
    pub file_name: String,
    pub is_active: bool,
}

fn describe(path: &Path) -> Result<CatalogInfo> {
    let conn = db::open_db(path)?;
    Ok(CatalogInfo {
        path: path.display().to_string(),
        udc: schema::get_or_create_catalog_code(&conn)?,
        replay_count: schema::count_replays(&conn)?,
        recycled_count: schema::count_recycled(&conn)?,
    })
}

/// Open (or switch to) an existing catalog and remember it as the active one.
pub fn open_catalog(state: &CatalogState, prefs: &mut PreferenceStore, path: &Path) -> Result<CatalogInfo> {
    let info = describe(path)?;
    state.set_catalog(Some(path.to_path_buf()))?;
    prefs.set_active_db_path(Some(path))?;
    log::info!("Opened catalog UDC-{} at {}", info.udc, info.path);
    Ok(info)
}

/// Create a new catalog in the active folder and switch to it.
pub fn create_catalog(state: &CatalogState, config: &AppConfig, prefs: &mut PreferenceStore) -> Result<CatalogInfo> {
    let (path, _) = db::create_catalog(&config.active_db_folder)?;
    open_catalog(state, prefs, &path)
}

/// Forget the active catalog.
pub fn close_catalog(state: &CatalogState, prefs: &mut PreferenceStore) -> Result<()> {
    state.set_catalog(None)?;
    prefs.set_active_db_path(None)?;
    Ok(())
}

/// Info for the active catalog
pub fn catalog_info(state: &CatalogState) -> Result<Option<CatalogInfo>> {
    match state.catalog_path()? {
        Some(path) => Ok(Some(describe(&path)?)),
        None => Ok(None),
    }
}

/// Reopen the catalog remembered in preferences, if it still exists.
pub fn restore_last_session(state: &CatalogState, prefs: &mut PreferenceStore) -> Result<Option<CatalogInfo>> {
    let Some(path) = prefs.active_db_path() else {
        return Ok(None);
    };

    if !path.is_file() {
        log::warn!("Last active catalog {} is gone", path.display());
        prefs.set_active_db_path(None)?;
        return Ok(None);
    }

    open_catalog(state, prefs, &path).map(Some)
}

pub fn list_catalogs(state: &CatalogState, config: &AppConfig) -> Result<Vec<CatalogListing>> {
    let active = state.catalog_path()?;
    let listings = db::list_catalogs(&config.active_db_folder)?
        .into_iter()
        .map(|path| CatalogListing {
            file_name: path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            is_active: active.as_deref() == Some(path.as_path()),
            path: path.display().to_string(),
        })
        .collect();
    Ok(listings)
}

/// Copy the active catalog into the backup folder.
pub fn backup_active_catalog(state: &CatalogState, config: &AppConfig) -> Result<PathBuf> {
    let path = state.catalog_path()?
        .ok_or_else(|| crate::error::CatalogError::StorageUnavailable("No catalog open".to_string()))?;
    db::backup_catalog(&path, &config.backup_db_folder, chrono::Local::now().naive_local())
}

/// Copy a backup into the active folder and switch to it.
pub fn restore_catalog_backup(
    state: &CatalogState,
    config: &AppConfig,
    prefs: &mut PreferenceStore,
    backup: &Path,
) -> Result<CatalogInfo> {
    // Drop the active path first so nothing else opens the file mid-copy
    let previous = state.catalog_path()?;
    state.set_catalog(None)?;

    let restored = db::restore_catalog(backup, &config.active_db_folder)
        .and_then(|path| open_catalog(state, prefs, &path));
    if restored.is_err() {
        state.set_catalog(previous)?;
    }
    restored
}
