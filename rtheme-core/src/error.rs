//! Error types for remote theme operations

use thiserror::Error;

/// Result type alias for remote theme operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for remote theme operations
///
/// `Fetch`, `Import` and `State` are terminal for the operation that raised
/// them. Nothing in this crate retries; that is left to the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// Remote unreachable, or the clone/revision subprocess failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Descriptor file missing or malformed
    #[error("Import error: {0}")]
    Import(String),

    /// API misuse, e.g. reading a checkout before it was fetched
    #[error("State error: {0}")]
    State(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Theme persistence error
    #[error("Store error: {0}")]
    Store(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for network or subprocess failures
    pub fn is_fetch(&self) -> bool {
        matches!(self, Error::Fetch(_))
    }

    /// True for a missing or malformed descriptor
    pub fn is_import(&self) -> bool {
        matches!(self, Error::Import(_))
    }

    /// True for API misuse
    pub fn is_state(&self) -> bool {
        matches!(self, Error::State(_))
    }
}
