//! Error types for the stowage domain layer.
//!
//! HTTP-facing error shapes live in `server::error`; everything here is
//! transport-agnostic.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StowageError {
    #[error("Invalid itemId")]
    UnknownItem(String),
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("CSV export failed: {0}")]
    Export(String),
    #[error("Out of range: {0}")]
    OutOfRange(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Config error: {0}")]
    Config(String),
}

pub type StowageResult<T> = Result<T, StowageError>;

impl StowageError {
    /// Whether the error refers to an item id that is not registered.
    pub fn is_unknown_item(&self) -> bool {
        matches!(self, StowageError::UnknownItem(_))
    }
}

impl From<std::io::Error> for StowageError {
    fn from(e: std::io::Error) -> Self {
        StowageError::Io(e.to_string())
    }
}

/// Reading side only; the export writer maps its own failures to `Export`.
impl From<csv::Error> for StowageError {
    fn from(e: csv::Error) -> Self {
        StowageError::Csv(e.to_string())
    }
}

impl From<toml::de::Error> for StowageError {
    fn from(e: toml::de::Error) -> Self {
        StowageError::Config(e.to_string())
    }
}
