//! Error types for review runs

use drhp_analysis::AnalysisError;
use drhp_retrieval::SearchError;
use thiserror::Error;

/// A remote call that halted the review
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReviewError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl ReviewError {
    /// Message suitable for showing to the person who submitted the query
    pub fn user_message(&self) -> String {
        match self {
            Self::Search(SearchError::Status { status, message }) => {
                format!("AutoRAG API Error: {status} - {message}")
            }
            Self::Search(e) => format!("Search failed: {}", e.message()),
            Self::Analysis(e) => format!("Analysis failed: {}", e.detail()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;
