//! Error types for the legend cache

use thiserror::Error;

use crate::legend::CharacterId;

/// Main error type for legend cache operations
#[derive(Error, Debug)]
pub enum LegendCacheError {
    /// The registry has no record for the requested character
    #[error("Character not found: {0}")]
    NotFound(CharacterId),

    /// Transient failure reading the cold store (I/O, connectivity, etc.)
    #[error("Registry error: {0}")]
    Registry(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl LegendCacheError {
    /// Returns true for the registry's "no such character" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, LegendCacheError::NotFound(_))
    }
}

impl From<serde_json::Error> for LegendCacheError {
    fn from(e: serde_json::Error) -> Self {
        LegendCacheError::Serialization(e.to_string())
    }
}

/// Result type alias for legend cache operations
pub type Result<T> = std::result::Result<T, LegendCacheError>;
