//! Error types for analysis operations

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The generation endpoint rejected the request
    #[error("Analysis API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The request could not be sent or the response never arrived
    #[error("Analysis transport error: {0}")]
    Transport(String),

    /// The stream broke or carried an error after it was opened
    #[error("Analysis stream error: {0}")]
    Stream(String),

    #[error("Analysis configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    /// Human-readable detail without the variant prefix
    pub fn detail(&self) -> &str {
        match self {
            Self::Api { message, .. } => message,
            Self::Transport(detail) | Self::Stream(detail) | Self::Config(detail) => detail,
        }
    }
}

impl From<drhp_core::Error> for AnalysisError {
    fn from(err: drhp_core::Error) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
