//! Configuration module for the DRHP review pipeline
//!
//! This module provides configuration structures and loading mechanisms for the
//! search and analysis clients. Configuration can be loaded from TOML files and/or
//! environment variables. Secrets are never printed by the `Debug` implementations.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use defaults::*;

const REDACTED: &str = "***REDACTED***";

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.drhp-review/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".drhp-review").join("config.toml"))
}

/// Main configuration structure, built once at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Semantic search (AutoRAG) configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Generative analysis (Gemini) configuration
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Configuration for the remote semantic search index
#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// API root; the account and index path segments are appended to it
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Account identifier owning the index
    #[serde(default)]
    pub account_id: Option<String>,

    /// Name of the AutoRAG index to query
    #[serde(default)]
    pub index_name: Option<String>,

    /// Bearer token for the search API (or use API_TOKEN env var)
    #[serde(default)]
    pub api_token: Option<String>,

    /// Maximum number of matches requested and kept
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Minimum relevance score the service should apply
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,

    /// Value sent as `autoragDatabase`
    #[serde(default = "default_autorag_database")]
    pub autorag_database: String,

    /// Optional `entityType` filter, omitted from the request when unset
    #[serde(default)]
    pub entity_type: Option<String>,

    /// Request timeout in seconds; the HTTP client default applies when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            account_id: None,
            index_name: None,
            api_token: None,
            max_results: default_max_results(),
            score_threshold: default_score_threshold(),
            autorag_database: default_autorag_database(),
            entity_type: None,
            timeout_secs: None,
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("base_url", &self.base_url)
            .field("account_id", &self.account_id.as_ref().map(|_| REDACTED))
            .field("index_name", &self.index_name.as_ref().map(|_| REDACTED))
            .field("api_token", &self.api_token.as_ref().map(|_| REDACTED))
            .field("max_results", &self.max_results)
            .field("score_threshold", &self.score_threshold)
            .field("autorag_database", &self.autorag_database)
            .field("entity_type", &self.entity_type)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Configuration for the streaming generation endpoint
#[derive(Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// API root for the generative language service
    #[serde(default = "default_analysis_base_url")]
    pub base_url: String,

    /// API key (or use GEMINI_API_KEY env var)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_analysis_model")]
    pub model: String,

    /// Reasoning token budget passed to the model (-1 = dynamic, 0 = off).
    /// Reasoning text is never requested back regardless of this value.
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: i64,

    /// Request timeout in seconds; the HTTP client default applies when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: default_analysis_base_url(),
            api_key: None,
            model: default_analysis_model(),
            thinking_budget: default_thinking_budget(),
            timeout_secs: None,
        }
    }
}

impl std::fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("model", &self.model)
            .field("thinking_budget", &self.thinking_budget)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Returns the value of a required secret, rejecting missing or blank values
fn require_secret<'a>(value: Option<&'a String>, name: &str, env_hint: &str) -> Result<&'a str> {
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::config(format!(
            "{name} is required. Set it in the config file or the {env_hint} env var"
        ))),
    }
}

impl SearchConfig {
    /// Account identifier, validated to be present
    pub fn account_id(&self) -> Result<&str> {
        require_secret(
            self.account_id.as_ref(),
            "search.account_id",
            "CLOUDFLARE_ACCOUNT_ID",
        )
    }

    /// Index name, validated to be present
    pub fn index_name(&self) -> Result<&str> {
        require_secret(self.index_name.as_ref(), "search.index_name", "AUTORAG_INDEX")
    }

    /// Bearer token, validated to be present
    pub fn api_token(&self) -> Result<&str> {
        require_secret(self.api_token.as_ref(), "search.api_token", "API_TOKEN")
    }

    pub fn validate(&self) -> Result<()> {
        self.account_id()?;
        self.index_name()?;
        self.api_token()?;

        if self.base_url.trim().is_empty() {
            return Err(Error::config("search.base_url must not be empty"));
        }
        if self.max_results == 0 {
            return Err(Error::config(
                "search.max_results must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(Error::config(format!(
                "search.score_threshold must be between 0.0 and 1.0 (got {})",
                self.score_threshold
            )));
        }
        Ok(())
    }
}

impl AnalysisConfig {
    /// API key, validated to be present
    pub fn api_key(&self) -> Result<&str> {
        require_secret(self.api_key.as_ref(), "analysis.api_key", "GEMINI_API_KEY")
    }

    pub fn validate(&self) -> Result<()> {
        self.api_key()?;

        if self.base_url.trim().is_empty() {
            return Err(Error::config("analysis.base_url must not be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(Error::config("analysis.model must not be empty"));
        }
        Ok(())
    }
}

impl Config {
    /// Validates every section, returning the first problem found
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.analysis.validate()?;
        Ok(())
    }
}
