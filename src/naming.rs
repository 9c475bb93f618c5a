// Replay Keeper - Naming policy
// Systematic file names: {character}_{UFC}_UDC-{code}_{MM-DD-YYYY_HH-MM-SS}.{ext}

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::constants::NAME_TIMESTAMP_FORMAT;
use crate::error::{CatalogError, Result};

fn reserved_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[\\/:\*\?"<>\|]"#).expect("static regex"))
}

fn dash_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-+").expect("static regex"))
}

/// Make a character name safe for a file name.
/// `"Chun-Li!! "` becomes `"chun-li"`, `"M. Bison"` becomes `"m.-bison"`.
pub fn sanitize_character_name(name: &str) -> String {
    let replaced = reserved_chars().replace_all(name, "_");
    let lowered = replaced.to_lowercase().replace(' ', "-");

    let kept: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();

    dash_runs().replace_all(&kept, "-").trim_matches('-').to_string()
}

/// Systematic stem (no extension) for a replay file.
pub fn build_systematic_name(character: &str, ufc: &str, udc: &str, at: NaiveDateTime) -> Result<String> {
    let safe = sanitize_character_name(character);
    if safe.is_empty() {
        return Err(CatalogError::Validation(format!(
            "character name '{}' has no usable characters",
            character
        )));
    }
    Ok(format!("{}_{}_UDC-{}_{}", safe, ufc, udc, at.format(NAME_TIMESTAMP_FORMAT)))
}

fn file_name_for(stem: &str, ext: &str) -> String {
    let ext = ext.trim_start_matches('.');
    if ext.is_empty() {
        stem.to_string()
    } else {
        format!("{}.{}", stem, ext)
    }
}

/// First of `stem.ext`, `stem_1.ext`, `stem_2.ext`, ... that does not exist in `dir`.
pub fn resolve_collision_free_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let candidate = dir.join(file_name_for(stem, ext));
    if !candidate.exists() {
        return candidate;
    }

    let mut counter = 1u32;
    loop {
        let candidate = dir.join(file_name_for(&format!("{}_{}", stem, counter), ext));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Move a replay file to its systematic name in the same directory.
/// Returns the new path.
pub fn rename_replay_file(
    original: &Path,
    character: &str,
    ufc: &str,
    udc: &str,
    at: NaiveDateTime,
) -> Result<PathBuf> {
    if !original.is_file() {
        return Err(CatalogError::AssetMissing(original.display().to_string()));
    }

    let stem = build_systematic_name(character, ufc, udc, at)?;
    let dir = original.parent().unwrap_or(Path::new("."));
    let ext = original.extension().and_then(|e| e.to_str()).unwrap_or("");
    let target = resolve_collision_free_path(dir, &stem, ext);

    move_file(original, &target)?;
    log::info!("Renamed {} -> {}", original.display(), target.display());
    Ok(target)
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }

    // Cross-device: copy then remove, cleaning up a partial copy on failure
    if let Err(e) = std::fs::copy(from, to) {
        let _ = std::fs::remove_file(to);
        return Err(e.into());
    }
    std::fs::remove_file(from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 3).unwrap().and_hms_opt(4, 5, 6).unwrap()
    }

    #[test]
    fn test_sanitize_examples() {
        assert_eq!(sanitize_character_name("Chun-Li!! "), "chun-li");
        assert_eq!(sanitize_character_name("M. Bison"), "m.-bison");
        assert_eq!(sanitize_character_name("Dee  Jay"), "dee-jay");
        assert_eq!(sanitize_character_name("A/K:I"), "a_k_i");
        assert_eq!(sanitize_character_name("  ---  "), "");
    }

    #[test]
    fn test_systematic_name_format() {
        let name = build_systematic_name("Ryu", "UFC-1A2B", "7C1D09AB", at()).unwrap();
        assert_eq!(name, "ryu_UFC-1A2B_UDC-7C1D09AB_02-03-2026_04-05-06");
    }

    #[test]
    fn test_systematic_name_rejects_empty_character() {
        let err = build_systematic_name("!!!", "UFC-1A2B", "X", at()).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn test_collision_free_path_counts_up() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_collision_free_path(dir.path(), "clip", "mp4"), dir.path().join("clip.mp4"));

        std::fs::write(dir.path().join("clip.mp4"), b"x").unwrap();
        assert_eq!(resolve_collision_free_path(dir.path(), "clip", "mp4"), dir.path().join("clip_1.mp4"));

        std::fs::write(dir.path().join("clip_1.mp4"), b"x").unwrap();
        assert_eq!(resolve_collision_free_path(dir.path(), "clip", ".mp4"), dir.path().join("clip_2.mp4"));
    }

    #[test]
    fn test_rename_replay_file_moves_and_keeps_extension() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("raw capture.mp4");
        std::fs::write(&original, b"video").unwrap();

        let renamed = rename_replay_file(&original, "Ken", "UFC-0001", "ABCDEF12", at()).unwrap();
        assert!(!original.exists());
        assert_eq!(
            renamed.file_name().unwrap().to_str().unwrap(),
            "ken_UFC-0001_UDC-ABCDEF12_02-03-2026_04-05-06.mp4"
        );
        assert_eq!(std::fs::read(&renamed).unwrap(), b"video");
    }

    #[test]
    fn test_rename_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = rename_replay_file(&dir.path().join("gone.mp4"), "Ken", "UFC-0001", "X", at()).unwrap_err();
        assert!(matches!(err, CatalogError::AssetMissing(_)));
    }
}
