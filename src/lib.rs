// Replay Keeper - Library Entry Point
// Catalog data layer for personal replay recordings. Front ends (the `rkm`
// CLI, or a desktop shell) call into `commands`.

pub mod constants;
pub mod error;
pub mod config;
pub mod db;
pub mod filter;
pub mod naming;
pub mod preferences;
pub mod assets;
pub mod export;
pub mod jobs;
pub mod commands;

pub use commands::CatalogState;
pub use config::AppConfig;
pub use error::{CatalogError, Result};
