use thiserror::Error;

/// Result type for drhp-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for configuration and model operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
