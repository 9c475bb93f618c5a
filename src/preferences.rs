// Replay Keeper - Preference store
// Flat JSON document. Loaded once, merged over defaults, saved on every change.
// Keys this build does not know about are carried through untouched.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ALT_CHARACTERS;
use crate::error::{CatalogError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub main_character: Option<String>,
    pub main_character_path: Option<String>,
    pub rank_badge_path: Option<String>,
    pub alt_characters: Vec<String>,
    pub dark_mode: bool,
    pub active_db_path: Option<String>,
    pub character_name_override: Option<String>,
    /// Character used when renaming replay files
    pub rename_character: Option<String>,
    /// Character used when building names for newly added replays
    pub filename_character: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            main_character: None,
            main_character_path: None,
            rank_badge_path: None,
            alt_characters: DEFAULT_ALT_CHARACTERS.iter().map(|s| s.to_string()).collect(),
            dark_mode: false,
            active_db_path: None,
            character_name_override: None,
            rename_character: None,
            filename_character: None,
            extra: serde_json::Map::new(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    prefs: Preferences,
}

impl PreferenceStore {
    /// Load from `path`. A missing or unreadable file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let prefs = if path.exists() {
            match std::fs::read_to_string(&path)
                .map_err(CatalogError::from)
                .and_then(|text| serde_json::from_str::<Preferences>(&text).map_err(CatalogError::from))
            {
                Ok(prefs) => prefs,
                Err(e) => {
                    log::warn!("Failed to load preferences from {}: {}; using defaults", path.display(), e);
                    Preferences::default()
                }
            }
        } else {
            Preferences::default()
        };

        Self { path, prefs }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> &Preferences {
        &self.prefs
    }

    /// Display name of the main character: the override if set, else the picked one.
    pub fn main_character(&self) -> Option<&str> {
        self.prefs.character_name_override.as_deref()
            .filter(|s| !s.is_empty())
            .or(self.prefs.main_character.as_deref())
    }

    pub fn active_db_path(&self) -> Option<PathBuf> {
        self.prefs.active_db_path.as_ref().map(PathBuf::from)
    }

    /// Write the document to disk (temp file then rename).
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.prefs)?;
        let tmp_path = self.path.with_extension("json.tmp");
        {
            use std::io::Write;
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn update(&mut self, apply: impl FnOnce(&mut Preferences)) -> Result<()> {
        apply(&mut self.prefs);
        self.save()
    }

    /// Set the main character; the portrait path is only replaced when given.
    pub fn set_main_character(&mut self, name: Option<String>, portrait_path: Option<String>) -> Result<()> {
        self.update(|p| {
            p.main_character = non_empty(name);
            if let Some(path) = non_empty(portrait_path) {
                p.main_character_path = Some(path);
            }
        })
    }

    pub fn set_rank_badge_path(&mut self, path: Option<String>) -> Result<()> {
        self.update(|p| p.rank_badge_path = non_empty(path))
    }

    pub fn set_alt_characters(&mut self, characters: Vec<String>) -> Result<()> {
        self.update(|p| {
            p.alt_characters = characters
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        })
    }

    pub fn set_dark_mode(&mut self, enabled: bool) -> Result<()> {
        self.update(|p| p.dark_mode = enabled)
    }

    pub fn set_active_db_path(&mut self, path: Option<&Path>) -> Result<()> {
        self.update(|p| p.active_db_path = path.map(|path| path.display().to_string()))
    }

    pub fn set_character_name_override(&mut self, name: Option<String>) -> Result<()> {
        self.update(|p| p.character_name_override = non_empty(name))
    }

    pub fn set_rename_character(&mut self, name: Option<String>) -> Result<()> {
        self.update(|p| p.rename_character = non_empty(name))
    }

    pub fn set_filename_character(&mut self, name: Option<String>) -> Result<()> {
        self.update(|p| p.filename_character = non_empty(name))
    }

    /// Set a preference by key from text, as typed on a command line.
    /// An empty value clears optional keys. Unknown keys are stored as strings.
    pub fn set_by_key(&mut self, key: &str, value: &str) -> Result<()> {
        let text = Some(value.to_string());
        match key {
            "main_character" => self.update(|p| p.main_character = non_empty(text)),
            "main_character_path" => self.update(|p| p.main_character_path = non_empty(text)),
            "rank_badge_path" => self.set_rank_badge_path(text),
            "alt_characters" => self.set_alt_characters(value.split(',').map(str::to_string).collect()),
            "dark_mode" => {
                let enabled = match value.trim().to_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => true,
                    "false" | "0" | "no" | "off" => false,
                    other => return Err(CatalogError::Validation(format!("dark_mode expects true/false, got '{}'", other))),
                };
                self.set_dark_mode(enabled)
            }
            "active_db_path" => self.update(|p| p.active_db_path = non_empty(text)),
            "character_name_override" => self.set_character_name_override(text),
            "rename_character" => self.set_rename_character(text),
            "filename_character" => self.set_filename_character(text),
            other => {
                let key = other.to_string();
                self.update(|p| {
                    p.extra.insert(key, serde_json::Value::String(value.to_string()));
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let store = PreferenceStore::load(dir.path().join("preferences.json"));
        assert_eq!(store.get(), &Preferences::default());
        assert_eq!(store.get().alt_characters, vec!["Dhalsim", "Elena", "Cammy"]);
        assert!(!store.get().dark_mode);
        assert!(store.main_character().is_none());
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = PreferenceStore::load(&path);
        assert_eq!(store.get(), &Preferences::default());
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, r#"{"dark_mode": true, "main_character": "Ryu"}"#).unwrap();

        let store = PreferenceStore::load(&path);
        assert!(store.get().dark_mode);
        assert_eq!(store.main_character(), Some("Ryu"));
        assert_eq!(store.get().alt_characters.len(), 3);
    }

    #[test]
    fn test_setters_write_through() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("udc").join("preferences.json");

        let mut store = PreferenceStore::load(&path);
        store.set_dark_mode(true).unwrap();
        store.set_rename_character(Some("Ken".to_string())).unwrap();
        store.set_alt_characters(vec!["Juri".to_string(), " ".to_string()]).unwrap();

        let reloaded = PreferenceStore::load(&path);
        assert!(reloaded.get().dark_mode);
        assert_eq!(reloaded.get().rename_character.as_deref(), Some("Ken"));
        assert_eq!(reloaded.get().alt_characters, vec!["Juri"]);
    }

    #[test]
    fn test_override_wins_for_main_character() {
        let dir = TempDir::new().unwrap();
        let mut store = PreferenceStore::load(dir.path().join("p.json"));
        store.set_main_character(Some("Ryu".to_string()), Some("/p/ryu.png".to_string())).unwrap();
        assert_eq!(store.main_character(), Some("Ryu"));

        store.set_character_name_override(Some("Evil Ryu".to_string())).unwrap();
        assert_eq!(store.main_character(), Some("Evil Ryu"));

        store.set_character_name_override(Some(String::new())).unwrap();
        assert_eq!(store.main_character(), Some("Ryu"));
        assert_eq!(store.get().main_character_path.as_deref(), Some("/p/ryu.png"));
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, r#"{"window_geometry": [1, 2, 3], "dark_mode": false}"#).unwrap();

        let mut store = PreferenceStore::load(&path);
        store.set_dark_mode(true).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["window_geometry"], serde_json::json!([1, 2, 3]));
        assert_eq!(raw["dark_mode"], serde_json::json!(true));
    }

    #[test]
    fn test_set_by_key() {
        let dir = TempDir::new().unwrap();
        let mut store = PreferenceStore::load(dir.path().join("p.json"));

        store.set_by_key("dark_mode", "yes").unwrap();
        store.set_by_key("alt_characters", "Ryu, Ken").unwrap();
        store.set_by_key("theme_accent", "red").unwrap();
        assert!(store.get().dark_mode);
        assert_eq!(store.get().alt_characters, vec!["Ryu", "Ken"]);
        assert_eq!(store.get().extra["theme_accent"], serde_json::json!("red"));

        let err = store.set_by_key("dark_mode", "maybe").unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }
}
