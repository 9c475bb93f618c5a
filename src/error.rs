// Replay Keeper Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Replay not found: {0}")]
    NotFound(String),

    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    #[error("Catalog unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Asset missing: {0}")]
    AssetMissing(String),

    #[error("{0}")]
    Other(String),
}

impl CatalogError {
    /// True when the same call can succeed with a freshly generated identifier.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CatalogError::DuplicateIdentifier(_))
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        CatalogError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
