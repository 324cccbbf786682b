//! Request-scoped data model shared by the search, analysis and review crates
//!
//! Every value here lives for a single review request and is discarded after it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A user query that is known to contain non-whitespace text
///
/// The text is kept exactly as entered; only the emptiness check trims it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    /// Returns `None` when the input is empty or whitespace only
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters, as reported to the search service
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One retrieved excerpt and its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub text: String,
    pub score: f64,
}

impl Match {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// Matches in the order the search service ranked them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchSet(Vec<Match>);

impl MatchSet {
    pub fn new(matches: Vec<Match>) -> Self {
        Self(matches)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.0.iter()
    }

    /// Drops everything past `limit`, keeping the service's ranking
    pub fn truncate(&mut self, limit: usize) {
        self.0.truncate(limit);
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|m| m.text.as_str())
    }

    pub fn into_inner(self) -> Vec<Match> {
        self.0
    }
}

impl From<Vec<Match>> for MatchSet {
    fn from(matches: Vec<Match>) -> Self {
        Self(matches)
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Fully rendered prompt sent to the generation endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt(String);

impl AnalysisPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AnalysisPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Model output accumulated from a completed stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisReport(String);

impl AnalysisReport {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Appends the next chunk in arrival order
    pub fn push_chunk(&mut self, chunk: &str) {
        self.0.push_str(chunk);
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_rejects_blank_input() {
        assert!(Query::new("").is_none());
        assert!(Query::new("   \n\t").is_none());
    }

    #[test]
    fn test_query_keeps_text_untrimmed() {
        let query = Query::new("  related party transactions ").unwrap();
        assert_eq!(query.as_str(), "  related party transactions ");
    }

    #[test]
    fn test_query_char_len_counts_characters() {
        let query = Query::new("₹ crore").unwrap();
        assert_eq!(query.char_len(), 7);
        assert!(query.as_str().len() > 7);
    }

    #[test]
    fn test_match_set_truncate_keeps_order() {
        let mut set = MatchSet::new(vec![
            Match::new("a", 0.9),
            Match::new("b", 0.2),
            Match::new("c", 0.7),
        ]);
        set.truncate(2);
        assert_eq!(set.texts().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_match_set_serializes_as_array() {
        let set = MatchSet::new(vec![Match::new("x", 0.5)]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"[{"text":"x","score":0.5}]"#);
    }

    #[test]
    fn test_report_accumulates_in_order() {
        let mut report = AnalysisReport::default();
        assert!(report.is_empty());
        for chunk in ["Red", " flags:", " none"] {
            report.push_chunk(chunk);
        }
        assert_eq!(report.as_str(), "Red flags: none");
    }
}
