//! Default values and functions for configuration

// Default constants
pub(crate) const DEFAULT_SEARCH_BASE_URL: &str = "https://api.cloudflare.com/client/v4";
pub(crate) const DEFAULT_AUTORAG_DATABASE: &str = "ipodb";
pub(crate) const DEFAULT_ANALYSIS_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub(crate) const DEFAULT_ANALYSIS_MODEL: &str = "gemini-2.5-flash";

pub(crate) fn default_search_base_url() -> String {
    DEFAULT_SEARCH_BASE_URL.to_string()
}

pub(crate) fn default_max_results() -> usize {
    20
}

pub(crate) fn default_score_threshold() -> f64 {
    0.15
}

pub(crate) fn default_autorag_database() -> String {
    DEFAULT_AUTORAG_DATABASE.to_string()
}

pub(crate) fn default_analysis_base_url() -> String {
    DEFAULT_ANALYSIS_BASE_URL.to_string()
}

pub(crate) fn default_analysis_model() -> String {
    DEFAULT_ANALYSIS_MODEL.to_string()
}

/// -1 lets the model pick its own reasoning budget
pub(crate) fn default_thinking_budget() -> i64 {
    -1
}
