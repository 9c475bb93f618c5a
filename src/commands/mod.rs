// Replay Keeper - Commands Module
// Entry points a presentation layer calls, organized by domain

pub mod catalogs;
pub mod replays;
pub mod recycle_bin;
pub mod tags;
pub mod rename;

#[cfg(test)]
mod tests;

pub use catalogs::*;
pub use replays::*;
pub use recycle_bin::*;
pub use tags::*;
pub use rename::*;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use serde::Serialize;

use crate::error::{CatalogError, Result};
use crate::jobs::sweeper::SharedCatalogPath;

/// Active catalog state.
/// Stores only the catalog path, never a Connection; each command opens a
/// short-lived connection via connect(). The same path is shared with the sweeper.
#[derive(Debug, Clone, Default)]
pub struct CatalogState(pub SharedCatalogPath);

impl CatalogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(path: PathBuf) -> Self {
        Self(Arc::new(Mutex::new(Some(path))))
    }

    fn guard(&self) -> Result<MutexGuard<'_, Option<PathBuf>>> {
        self.0.lock().map_err(|e| CatalogError::Other(e.to_string()))
    }

    /// Open a short-lived catalog connection from the stored path.
    pub fn connect(&self) -> Result<Connection> {
        let path = self.catalog_path()?
            .ok_or_else(|| CatalogError::StorageUnavailable("No catalog open".to_string()))?;
        crate::db::open_db(&path)
    }

    /// Stored catalog path, if any.
    pub fn catalog_path(&self) -> Result<Option<PathBuf>> {
        Ok(self.guard()?.clone())
    }

    pub fn set_catalog(&self, path: Option<PathBuf>) -> Result<()> {
        *self.guard()? = path;
        Ok(())
    }

    /// Clone the inner Arc for the sweeper thread.
    pub fn shared(&self) -> SharedCatalogPath {
        Arc::clone(&self.0)
    }
}

/// Outcome of an operation applied to several replays.
/// Each item is independent; one failure does not stop the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub done: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl BatchResult {
    pub(crate) fn run<F>(ufcs: &[String], mut op: F) -> Self
    where
        F: FnMut(&str) -> Result<()>,
    {
        let mut result = Self::default();
        for ufc in ufcs {
            match op(ufc) {
                Ok(()) => result.done.push(ufc.clone()),
                Err(e) => {
                    log::warn!("{}: {}", ufc, e);
                    result.failed.push((ufc.clone(), e.to_string()));
                }
            }
        }
        result
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}
