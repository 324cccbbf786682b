//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;

use super::defaults::*;
use super::{global_config_path, Config};

type Builder = LibConfigBuilder<config::builder::DefaultState>;

/// Legacy secret variables and the config keys they override
pub(super) const LEGACY_SECRET_VARS: &[(&str, &str)] = &[
    ("API_TOKEN", "search.api_token"),
    ("CLOUDFLARE_ACCOUNT_ID", "search.account_id"),
    ("AUTORAG_INDEX", "search.index_name"),
    ("GEMINI_API_KEY", "analysis.api_key"),
];

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: Builder,
    key: &str,
    value: T,
) -> Result<Builder> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `DRHP_` and use double underscores
    /// for nested values. For example:
    /// - `DRHP_SEARCH__MAX_RESULTS=10`
    /// - `DRHP_ANALYSIS__MODEL=gemini-2.5-pro`
    ///
    /// The legacy secret variables (`API_TOKEN`, `CLOUDFLARE_ACCOUNT_ID`,
    /// `AUTORAG_INDEX`, `GEMINI_API_KEY`) take precedence over everything else.
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        // Section defaults (config crate doesn't apply serde defaults for missing sections)
        let builder = set_config_default(builder, "search.base_url", default_search_base_url())?;
        let builder =
            set_config_default(builder, "search.max_results", default_max_results() as i64)?;
        let builder =
            set_config_default(builder, "search.score_threshold", default_score_threshold())?;
        let builder = set_config_default(
            builder,
            "search.autorag_database",
            default_autorag_database(),
        )?;
        let builder =
            set_config_default(builder, "analysis.base_url", default_analysis_base_url())?;
        let builder = set_config_default(builder, "analysis.model", default_analysis_model())?;
        let mut builder = set_config_default(
            builder,
            "analysis.thinking_budget",
            default_thinking_budget(),
        )?;

        // Add the config file if it exists
        if path.exists() {
            tracing::debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path));
        }

        // Add environment variables with DRHP_ prefix
        builder = builder.add_source(
            Environment::with_prefix("DRHP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        for (var, key) in LEGACY_SECRET_VARS {
            if let Ok(value) = std::env::var(var) {
                builder = builder
                    .set_override(*key, value)
                    .map_err(|e| Error::config(format!("Failed to set {var}: {e}")))?;
            }
        }

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from a single file
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.drhp-review/config.toml or custom --config path)
    /// 3. Environment variables (DRHP_*)
    /// 4. Legacy secret variables (API_TOKEN, GEMINI_API_KEY, ...)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        Self::from_file(&path)
    }
}
