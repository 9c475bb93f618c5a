// Replay Keeper - App configuration
// Built once at startup and handed by reference to everything that needs a path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::error::{CatalogError, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub home: PathBuf,
    pub portraits_dir: PathBuf,
    pub rank_portraits_dir: PathBuf,
    pub quotes_path: PathBuf,
    pub active_db_folder: PathBuf,
    pub backup_db_folder: PathBuf,
    pub preferences_path: PathBuf,
    pub retention_days: i64,
    pub sweep_interval: Duration,
    pub portrait_cache_capacity: usize,
}

impl AppConfig {
    /// Lay out every path under a single home directory.
    pub fn from_home(home: impl AsRef<Path>) -> Self {
        let home = home.as_ref().to_path_buf();
        let assets = home.join(ASSETS_FOLDER);
        let active_db_folder = home.join(ACTIVE_DB_FOLDER);

        Self {
            portraits_dir: assets.join(PORTRAITS_FOLDER),
            rank_portraits_dir: assets.join(RANK_PORTRAITS_FOLDER),
            quotes_path: assets.join(QUOTES_FOLDER).join(QUOTES_FILENAME),
            preferences_path: active_db_folder.join(PREFERENCES_FILENAME),
            backup_db_folder: home.join(BACKUP_DB_FOLDER),
            active_db_folder,
            retention_days: RECYCLE_BIN_AUTO_DELETE_DAYS,
            sweep_interval: Duration::from_secs(RECYCLE_BIN_CHECK_INTERVAL_SECS),
            portrait_cache_capacity: PORTRAIT_CACHE_CAPACITY,
            home,
        }
    }

    /// Resolve the home directory: explicit argument, then `RKM_HOME`,
    /// then the platform data directory.
    pub fn resolve(home_override: Option<PathBuf>) -> Result<Self> {
        if let Some(home) = home_override {
            return Ok(Self::from_home(home));
        }

        if let Ok(home) = std::env::var(HOME_ENV_VAR) {
            if !home.trim().is_empty() {
                return Ok(Self::from_home(home));
            }
        }

        let dirs = directories::ProjectDirs::from("", "", "ReplayKeeper")
            .ok_or_else(|| CatalogError::Other("Could not determine data directory".to_string()))?;
        Ok(Self::from_home(dirs.data_dir()))
    }

    /// Create the catalog and backup folders if missing.
    pub fn ensure_folders(&self) -> Result<()> {
        std::fs::create_dir_all(&self.active_db_folder)?;
        std::fs::create_dir_all(&self.backup_db_folder)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_home_layout() {
        let config = AppConfig::from_home("/data/rkm");
        assert_eq!(config.active_db_folder, PathBuf::from("/data/rkm/udc"));
        assert_eq!(config.preferences_path, PathBuf::from("/data/rkm/udc/preferences.json"));
        assert_eq!(
            config.quotes_path,
            PathBuf::from("/data/rkm/assets/quotes/character_quotes.json")
        );
        assert_eq!(config.retention_days, 30);
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_resolve_prefers_explicit_home() {
        let config = AppConfig::resolve(Some(PathBuf::from("/explicit"))).unwrap();
        assert_eq!(config.home, PathBuf::from("/explicit"));
    }
}
