//! Core types for the DRHP compliance review pipeline
//!
//! This crate provides the foundational pieces shared by the other crates:
//!
//! - **Models**: queries, matches, prompts and reports for a single request
//! - **Configuration**: layered loading of endpoints, limits and secrets
//! - **Error handling**: unified error types

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod models;

// Re-export main types for convenience
pub use config::{AnalysisConfig, Config, SearchConfig};
pub use error::{Error, Result};
pub use models::{AnalysisPrompt, AnalysisReport, Match, MatchSet, Query};
