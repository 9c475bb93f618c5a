// Replay Keeper - Rename Files Command
// Moves recorded video files to their systematic names and records the new name.

use std::path::PathBuf;

use serde::Serialize;

use crate::db::schema::{self, ReplayUpdate};
use crate::error::{CatalogError, Result};
use crate::naming;
use crate::preferences::PreferenceStore;
use super::CatalogState;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameReport {
    pub renamed: Vec<(String, PathBuf)>,
    pub failed: Vec<(String, String)>,
}

/// Rename `files[i]` after replay `ufcs[i]`. The character comes from
/// `character` or, failing that, the rename-character preference.
pub fn rename_replay_files(
    state: &CatalogState,
    prefs: &PreferenceStore,
    ufcs: &[String],
    files: &[PathBuf],
    character: Option<&str>,
) -> Result<RenameReport> {
    if ufcs.len() != files.len() {
        return Err(CatalogError::Validation(format!(
            "{} replays but {} files; pass one file per replay",
            ufcs.len(),
            files.len()
        )));
    }

    let character = character
        .map(str::to_string)
        .or_else(|| prefs.get().rename_character.clone())
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| CatalogError::Validation("no rename character set".to_string()))?;

    let conn = state.connect()?;
    let udc = schema::get_or_create_catalog_code(&conn)?;
    let now = chrono::Local::now().naive_local();

    let mut report = RenameReport::default();
    for (ufc, file) in ufcs.iter().zip(files) {
        let outcome = (|| -> Result<PathBuf> {
            if schema::get_replay(&conn, ufc)?.is_none() {
                return Err(CatalogError::NotFound(ufc.clone()));
            }
            let new_path = naming::rename_replay_file(file, &character, ufc, &udc, now)?;
            let new_name = new_path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            schema::update_replay(&conn, ufc, &ReplayUpdate {
                renamed_filename: Some(new_name),
                ..Default::default()
            })?;
            Ok(new_path)
        })();

        match outcome {
            Ok(path) => report.renamed.push((ufc.clone(), path)),
            Err(e) => {
                log::warn!("Rename for {} failed: {}", ufc, e);
                report.failed.push((ufc.clone(), e.to_string()));
            }
        }
    }

    log::info!("Renamed {} files as '{}' ({} failed)", report.renamed.len(), character, report.failed.len());
    Ok(report)
}
