//! Error types for Atlas

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AtlasError>;

#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Either upstream read failed (transport error or non-success
    /// status). The two causes are deliberately not distinguished.
    #[error("External data source unavailable")]
    UpstreamUnavailable,

    #[error("No country found with the name {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for AtlasError {
    fn from(e: serde_json::Error) -> Self {
        AtlasError::Serialization(e.to_string())
    }
}
