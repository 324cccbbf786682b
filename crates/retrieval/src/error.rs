//! Error types for the retrieval module

use thiserror::Error;

/// Errors that can occur while querying the search index
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// The service answered with a non-success status
    #[error("Search API error {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection, timeout or undecodable response
    #[error("Search transport error: {0}")]
    Transport(String),

    /// The client could not be built from configuration
    #[error("Search configuration error: {0}")]
    Config(String),
}

impl SearchError {
    /// Human-readable message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Status { message, .. } => message,
            Self::Transport(detail) | Self::Config(detail) => detail,
        }
    }
}

impl From<drhp_core::Error> for SearchError {
    fn from(err: drhp_core::Error) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
