// Facade tests: each runs against a real catalog file in a temp home.

use super::*;
use crate::config::AppConfig;
use crate::db::schema::{self, ReplayUpdate, TextColumn};
use crate::error::CatalogError;
use crate::filter::{RecordedFilter, ReplayFilter, SortColumn, SortOrder, SortSpec, TagMode};
use crate::preferences::PreferenceStore;
use chrono::NaiveDate;
use std::path::PathBuf;
use tempfile::TempDir;

/// Temp home with a fresh catalog already open.
fn setup() -> (TempDir, AppConfig, PreferenceStore, CatalogState) {
    let home = TempDir::new().unwrap();
    let config = AppConfig::from_home(home.path());
    config.ensure_folders().unwrap();
    let mut prefs = PreferenceStore::load(&config.preferences_path);
    let state = CatalogState::new();
    create_catalog(&state, &config, &mut prefs).unwrap();
    (home, config, prefs, state)
}

fn request(character: &str, tags: &str) -> AddReplayRequest {
    AddReplayRequest {
        character: character.to_string(),
        timestamp: "02:10".to_string(),
        video_link: "https://example.com/v".to_string(),
        description: format!("{} set", character),
        tags: tags.to_string(),
    }
}

fn ufcs(replays: &[schema::Replay]) -> Vec<String> {
    replays.iter().map(|r| r.ufc.clone()).collect()
}

// ---------------------------------------------------------------
// Catalog lifecycle
// ---------------------------------------------------------------

#[test]
fn test_no_catalog_is_storage_unavailable() {
    let state = CatalogState::new();
    let err = list_visible(&state, &ReplayFilter::default(), &SortSpec::default()).unwrap_err();
    assert!(matches!(err, CatalogError::StorageUnavailable(_)));
}

#[test]
fn test_create_catalog_becomes_active_and_is_remembered() {
    let (_home, config, prefs, state) = setup();
    let active = state.catalog_path().unwrap().unwrap();
    assert_eq!(prefs.active_db_path(), Some(active.clone()));

    let listings = list_catalogs(&state, &config).unwrap();
    assert_eq!(listings.len(), 1);
    assert!(listings[0].is_active);

    let info = catalog_info(&state).unwrap().unwrap();
    assert_eq!(info.replay_count, 0);
    assert!(listings[0].file_name.contains(&info.udc));
}

#[test]
fn test_switching_catalogs_keeps_records_apart() {
    let (_home, config, mut prefs, state) = setup();
    let first = state.catalog_path().unwrap().unwrap();
    add_replay(&state, &request("Ryu", "")).unwrap();

    create_catalog(&state, &config, &mut prefs).unwrap();
    assert!(list_visible(&state, &ReplayFilter::default(), &SortSpec::default()).unwrap().is_empty());

    open_catalog(&state, &mut prefs, &first).unwrap();
    assert_eq!(list_visible(&state, &ReplayFilter::default(), &SortSpec::default()).unwrap().len(), 1);
}

#[test]
fn test_open_missing_catalog_leaves_state_alone() {
    let (home, _config, mut prefs, state) = setup();
    let before = state.catalog_path().unwrap();
    let err = open_catalog(&state, &mut prefs, &home.path().join("nope.db")).unwrap_err();
    assert!(matches!(err, CatalogError::StorageUnavailable(_)));
    assert_eq!(state.catalog_path().unwrap(), before);
}

#[test]
fn test_restore_last_session() {
    let (_home, config, _prefs, state) = setup();
    let path = state.catalog_path().unwrap().unwrap();

    // A new process: fresh state, preferences reloaded from disk
    let fresh = CatalogState::new();
    let mut prefs = PreferenceStore::load(&config.preferences_path);
    let info = restore_last_session(&fresh, &mut prefs).unwrap().unwrap();
    assert_eq!(PathBuf::from(info.path), path);

    std::fs::remove_file(&path).unwrap();
    let again = CatalogState::new();
    assert!(restore_last_session(&again, &mut prefs).unwrap().is_none());
    assert!(prefs.active_db_path().is_none());
}

#[test]
fn test_close_catalog() {
    let (_home, _config, mut prefs, state) = setup();
    close_catalog(&state, &mut prefs).unwrap();
    assert!(state.catalog_path().unwrap().is_none());
    assert!(catalog_info(&state).unwrap().is_none());
}

#[test]
fn test_backup_then_restore_switches_to_copy() {
    let (_home, config, mut prefs, state) = setup();
    add_replay(&state, &request("Ken", "")).unwrap();

    let backup = backup_active_catalog(&state, &config).unwrap();
    assert!(backup.starts_with(&config.backup_db_folder));

    let info = restore_catalog_backup(&state, &config, &mut prefs, &backup).unwrap();
    assert_eq!(info.replay_count, 1);
    assert!(PathBuf::from(&info.path).starts_with(&config.active_db_folder));
}

#[test]
fn test_failed_restore_keeps_active_catalog() {
    let (home, config, mut prefs, state) = setup();
    add_replay(&state, &request("Ken", "")).unwrap();
    let active = state.catalog_path().unwrap().unwrap();

    let bad = home.path().join("broken.db");
    std::fs::write(&bad, vec![b'x'; 4096]).unwrap();

    let err = restore_catalog_backup(&state, &config, &mut prefs, &bad).unwrap_err();
    assert!(matches!(err, CatalogError::StorageUnavailable(_)));
    assert_eq!(state.catalog_path().unwrap(), Some(active));
    assert_eq!(catalog_info(&state).unwrap().unwrap().replay_count, 1);
    assert!(!config.active_db_folder.join("broken.db").exists());
}

// ---------------------------------------------------------------
// Replays
// ---------------------------------------------------------------

#[test]
fn test_add_replay_builds_systematic_name() {
    let (_home, _config, _prefs, state) = setup();
    let at = NaiveDate::from_ymd_opt(2026, 7, 8).unwrap().and_hms_opt(9, 10, 11).unwrap();
    let udc = catalog_info(&state).unwrap().unwrap().udc;

    let replay = add_replay_with(&state, &request("Chun-Li!! ", " b , a "), at, || "UFC-BEEF".to_string()).unwrap();
    assert_eq!(replay.ufc, "UFC-BEEF");
    assert_eq!(replay.file_name, format!("chun-li_UFC-BEEF_UDC-{}_07-08-2026_09-10-11", udc));
    assert_eq!(replay.tags, "b, a");
    assert!(!replay.recorded);
}

#[test]
fn test_add_replay_retries_taken_code() {
    let (_home, _config, _prefs, state) = setup();
    let at = NaiveDate::from_ymd_opt(2026, 7, 8).unwrap().and_hms_opt(9, 10, 11).unwrap();
    add_replay_with(&state, &request("Ryu", ""), at, || "UFC-0001".to_string()).unwrap();

    let mut codes = vec!["UFC-0002".to_string(), "UFC-0001".to_string()];
    let replay = add_replay_with(&state, &request("Ryu", ""), at, || codes.pop().unwrap()).unwrap();
    assert_eq!(replay.ufc, "UFC-0002");
}

#[test]
fn test_add_replay_gives_up_after_max_attempts() {
    let (_home, _config, _prefs, state) = setup();
    let at = NaiveDate::from_ymd_opt(2026, 7, 8).unwrap().and_hms_opt(9, 10, 11).unwrap();
    add_replay_with(&state, &request("Ryu", ""), at, || "UFC-0001".to_string()).unwrap();

    let err = add_replay_with(&state, &request("Ryu", ""), at, || "UFC-0001".to_string()).unwrap_err();
    assert!(matches!(err, CatalogError::Other(_)));
}

#[test]
fn test_add_replay_requires_usable_character() {
    let (_home, _config, _prefs, state) = setup();
    let err = add_replay(&state, &request("!!!", "")).unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));
}

#[test]
fn test_visible_list_filters_and_sorts() {
    let (_home, _config, _prefs, state) = setup();
    let ryu = add_replay(&state, &request("Ryu", "ranked, combo")).unwrap();
    let ken = add_replay(&state, &request("Ken", "Ranked")).unwrap();
    add_replay(&state, &request("Juri", "casual")).unwrap();
    set_recorded(&state, &ken.ufc, true).unwrap();

    let filter = ReplayFilter {
        tags: vec!["RANKED".to_string()],
        tag_mode: TagMode::Any,
        ..Default::default()
    };
    let sort = SortSpec::new(SortColumn::FileName, SortOrder::Ascending);
    assert_eq!(ufcs(&list_visible(&state, &filter, &sort).unwrap()), vec![ken.ufc.clone(), ryu.ufc.clone()]);

    let pending = ReplayFilter { recorded: RecordedFilter::NotRecorded, ..filter };
    assert_eq!(ufcs(&list_visible(&state, &pending, &sort).unwrap()), vec![ryu.ufc]);
}

#[test]
fn test_edit_replay() {
    let (_home, _config, _prefs, state) = setup();
    let replay = add_replay(&state, &request("Ryu", "")).unwrap();

    edit_replay(&state, &replay.ufc, &ReplayUpdate {
        extended_desc: Some("new notes".to_string()),
        ..Default::default()
    }).unwrap();
    assert_eq!(get_replay(&state, &replay.ufc).unwrap().extended_desc, "new notes");

    let err = get_replay(&state, "UFC-NONE").unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));
}

// ---------------------------------------------------------------
// Recycle bin
// ---------------------------------------------------------------

#[test]
fn test_delete_restore_purge_cycle() {
    let (_home, _config, _prefs, state) = setup();
    let a = add_replay(&state, &request("Ryu", "")).unwrap();
    let b = add_replay(&state, &request("Ken", "")).unwrap();

    let result = delete_replays(&state, &[a.ufc.clone(), b.ufc.clone(), "UFC-NONE".to_string()], false).unwrap();
    assert_eq!(result.done, vec![a.ufc.clone(), b.ufc.clone()]);
    assert_eq!(result.failed.len(), 1);
    assert!(!result.all_succeeded());
    assert_eq!(list_recycle_bin(&state).unwrap().len(), 2);

    let restored = restore_replays(&state, &[a.ufc.clone()]).unwrap();
    assert!(restored.all_succeeded());
    assert_eq!(get_replay(&state, &a.ufc).unwrap(), a);

    let purged = purge_replays(&state, &[b.ufc.clone()]).unwrap();
    assert!(purged.all_succeeded());
    assert!(list_recycle_bin(&state).unwrap().is_empty());
}

#[test]
fn test_permanent_delete_skips_bin() {
    let (_home, _config, _prefs, state) = setup();
    let a = add_replay(&state, &request("Ryu", "")).unwrap();
    delete_replays(&state, &[a.ufc.clone()], true).unwrap();
    assert!(list_recycle_bin(&state).unwrap().is_empty());
    assert!(matches!(get_replay(&state, &a.ufc), Err(CatalogError::NotFound(_))));
}

#[test]
fn test_empty_bin_and_sweep_now() {
    let (_home, _config, _prefs, state) = setup();
    let a = add_replay(&state, &request("Ryu", "")).unwrap();
    let b = add_replay(&state, &request("Ken", "")).unwrap();
    {
        let conn = state.connect().unwrap();
        let long_ago = chrono::Local::now().naive_local() - chrono::Duration::days(40);
        schema::soft_delete_replay_at(&conn, &a.ufc, long_ago).unwrap();
        schema::soft_delete_replay(&conn, &b.ufc).unwrap();
    }

    assert_eq!(sweep_now(&state, 30).unwrap(), 1);
    assert_eq!(empty_recycle_bin(&state).unwrap(), 1);
}

// ---------------------------------------------------------------
// Tags, replace, rename, export
// ---------------------------------------------------------------

#[test]
fn test_tags_and_replace() {
    let (_home, _config, _prefs, state) = setup();
    add_replay(&state, &request("Ryu", "ranked, ryu")).unwrap();
    add_replay(&state, &request("Ken", "casual")).unwrap();
    assert_eq!(list_tags(&state).unwrap(), vec!["casual", "ranked", "ryu"]);

    assert_eq!(preview_replace(&state, TextColumn::Tags, "ranked").unwrap(), 1);
    let result = replace_text(&state, TextColumn::Tags, "ranked", "ranked-s2").unwrap();
    assert_eq!(result.changed, 1);
    assert_eq!(list_tags(&state).unwrap(), vec!["casual", "ranked-s2", "ryu"]);
}

#[test]
fn test_rename_files_records_new_name() {
    let (home, _config, mut prefs, state) = setup();
    let replay = add_replay(&state, &request("Ryu", "")).unwrap();
    let video = home.path().join("capture.mp4");
    std::fs::write(&video, b"frames").unwrap();

    let err = rename_replay_files(&state, &prefs, &[replay.ufc.clone()], &[video.clone()], None).unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));

    prefs.set_rename_character(Some("Akuma".to_string())).unwrap();
    let report = rename_replay_files(&state, &prefs, &[replay.ufc.clone()], &[video.clone()], None).unwrap();
    assert_eq!(report.renamed.len(), 1);
    assert!(!video.exists());

    let new_path = &report.renamed[0].1;
    let name = new_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with(&format!("akuma_{}_UDC-", replay.ufc)));
    assert!(name.ends_with(".mp4"));
    assert_eq!(get_replay(&state, &replay.ufc).unwrap().renamed_filename, Some(name));
}

#[test]
fn test_rename_reports_missing_files() {
    let (home, _config, prefs, state) = setup();
    let replay = add_replay(&state, &request("Ryu", "")).unwrap();
    let report = rename_replay_files(
        &state,
        &prefs,
        &[replay.ufc.clone()],
        &[home.path().join("gone.mp4")],
        Some("Ryu"),
    ).unwrap();
    assert!(report.renamed.is_empty());
    assert_eq!(report.failed.len(), 1);
}

#[test]
fn test_export_visible_detects_format() {
    let (home, _config, _prefs, state) = setup();
    add_replay(&state, &request("Ryu", "ranked")).unwrap();
    add_replay(&state, &request("Ken", "casual")).unwrap();

    let filter = ReplayFilter { search: "ryu".to_string(), ..Default::default() };
    let out = home.path().join("export.json");
    let count = export_visible(&state, &filter, &SortSpec::default(), &out, None).unwrap();
    assert_eq!(count, 1);

    let parsed: Vec<schema::Replay> = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed.len(), 1);

    let err = export_visible(&state, &filter, &SortSpec::default(), &home.path().join("x.txt"), None).unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));
}
