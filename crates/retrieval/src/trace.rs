//! Request/response capture for the debug view

use serde::Serialize;

pub(crate) const REDACTED_BEARER: &str = "Bearer ***REDACTED***";

/// What was sent to the search endpoint and what came back
///
/// Header values that carry credentials are stored redacted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchTrace {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub payload: serde_json::Value,
    /// `None` when the request never received a response
    pub status: Option<u16>,
    pub response_body: Option<String>,
}

impl SearchTrace {
    pub(crate) fn new(url: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), REDACTED_BEARER.to_string()),
            ],
            payload,
            status: None,
            response_body: None,
        }
    }

    pub(crate) fn record_response(&mut self, status: u16, body: &str) {
        self.status = Some(status);
        self.response_body = Some(body.to_string());
    }
}
