//! Error types for codesift.
//!
//! One error enum covers the whole crate. Protocol-specific mapping
//! (HTTP status codes) lives in the `api` adapter.

use thiserror::Error;

/// Result type alias for codesift operations
pub type Result<T> = std::result::Result<T, SiftError>;

/// Main error type for the codesift service
#[derive(Error, Debug)]
pub enum SiftError {
    /// Invariant breach in caller input. Never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A document was absent on read.
    #[error("document not found: {0}")]
    NotFound(String),

    /// I/O or protocol failure from the search backend.
    #[error("search backend error: {0}")]
    Backend(String),

    /// Failure to obtain content from the repository source.
    #[error("repository source error: {0}")]
    Source(String),

    /// Query string could not be parsed.
    #[error("query parse error: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<git2::Error> for SiftError {
    fn from(e: git2::Error) -> Self {
        SiftError::Source(e.message().to_string())
    }
}

impl SiftError {
    /// Get user-friendly error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Check if this is a "not found" type error
    pub fn is_not_found(&self) -> bool {
        matches!(self, SiftError::NotFound(_))
    }

    /// Check if this is a bad request error (invalid input)
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            SiftError::Validation(_) | SiftError::Parse(_) | SiftError::Config(_)
        )
    }
}
