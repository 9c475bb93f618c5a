// Replay Keeper - Replay Commands
// Add, list, edit, mark and delete replays in the active catalog

use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::UFC_MAX_ATTEMPTS;
use crate::db::schema::{self, NewReplay, Replay, ReplayUpdate};
use crate::error::{CatalogError, Result};
use crate::export::{self, ExportFormat};
use crate::filter::{self, ReplayFilter, SortSpec};
use crate::naming;
use super::{BatchResult, CatalogState};

/// Fields a caller supplies for a new replay.
/// The stored file name is built from `character`, the new UFC and the catalog code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReplayRequest {
    pub character: String,
    pub timestamp: String,
    pub video_link: String,
    pub description: String,
    pub tags: String,
}

pub fn add_replay(state: &CatalogState, request: &AddReplayRequest) -> Result<Replay> {
    add_replay_with(state, request, chrono::Local::now().naive_local(), schema::generate_ufc)
}

/// Add with an explicit clock and code source. A code already in use is
/// replaced with a fresh one, up to `UFC_MAX_ATTEMPTS` times.
pub fn add_replay_with<F>(
    state: &CatalogState,
    request: &AddReplayRequest,
    now: NaiveDateTime,
    mut next_ufc: F,
) -> Result<Replay>
where
    F: FnMut() -> String,
{
    let conn = state.connect()?;
    let udc = schema::get_or_create_catalog_code(&conn)?;

    for attempt in 1..=UFC_MAX_ATTEMPTS {
        let ufc = next_ufc();
        let fields = NewReplay {
            file_name: naming::build_systematic_name(&request.character, &ufc, &udc, now)?,
            timestamp: request.timestamp.trim().to_string(),
            video_link: request.video_link.trim().to_string(),
            extended_desc: request.description.trim().to_string(),
            tags: schema::join_tags(&schema::parse_tags(&request.tags)),
        };

        match schema::insert_replay(&conn, &ufc, &fields) {
            Ok(replay) => {
                log::info!("Added replay {} ({})", replay.ufc, replay.file_name);
                return Ok(replay);
            }
            Err(e) if e.is_retryable() => {
                log::warn!("UFC {} already in use (attempt {}/{})", ufc, attempt, UFC_MAX_ATTEMPTS);
            }
            Err(e) => return Err(e),
        }
    }

    Err(CatalogError::Other(format!(
        "Could not allocate a unique file code after {} attempts",
        UFC_MAX_ATTEMPTS
    )))
}

/// Filtered, sorted view of the active catalog
pub fn list_visible(state: &CatalogState, filter: &ReplayFilter, sort: &SortSpec) -> Result<Vec<Replay>> {
    let conn = state.connect()?;
    let all = schema::list_replays(&conn)?;
    Ok(filter::visible_replays(&all, filter, sort))
}

pub fn get_replay(state: &CatalogState, ufc: &str) -> Result<Replay> {
    let conn = state.connect()?;
    schema::get_replay(&conn, ufc)?
        .ok_or_else(|| CatalogError::NotFound(ufc.to_string()))
}

pub fn edit_replay(state: &CatalogState, ufc: &str, updates: &ReplayUpdate) -> Result<()> {
    let conn = state.connect()?;
    schema::update_replay(&conn, ufc, updates)
}

pub fn set_recorded(state: &CatalogState, ufc: &str, recorded: bool) -> Result<()> {
    edit_replay(state, ufc, &ReplayUpdate {
        recorded: Some(recorded),
        ..Default::default()
    })
}

/// Move replays to the recycle bin, or remove them outright when `permanent`.
pub fn delete_replays(state: &CatalogState, ufcs: &[String], permanent: bool) -> Result<BatchResult> {
    let conn = state.connect()?;
    Ok(BatchResult::run(ufcs, |ufc| {
        if permanent {
            schema::delete_replay_permanently(&conn, ufc)
        } else {
            schema::soft_delete_replay(&conn, ufc)
        }
    }))
}

/// Export the filtered, sorted view. Format follows `format`, else the file extension.
pub fn export_visible(
    state: &CatalogState,
    filter: &ReplayFilter,
    sort: &SortSpec,
    output_path: &Path,
    format: Option<ExportFormat>,
) -> Result<usize> {
    let format = format
        .or_else(|| ExportFormat::from_path(output_path))
        .ok_or_else(|| CatalogError::Validation(format!(
            "cannot tell export format from {}; use .csv or .json",
            output_path.display()
        )))?;
    let visible = list_visible(state, filter, sort)?;
    export::export_to_file(output_path, format, &visible)
}
