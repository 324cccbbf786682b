//! Cloudflare AutoRAG search provider

use crate::error::{Result, SearchError};
use crate::trace::SearchTrace;
use crate::SearchClient;
use async_trait::async_trait;
use drhp_core::{Match, MatchSet, Query, SearchConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Request payload for the AutoRAG search API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AutoRagSearchRequest<'a> {
    query: &'a str,
    query_length: usize,
    max_results: usize,
    score_threshold: f64,
    autorag_database: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_type: Option<&'a str>,
}

/// Successful response from the AutoRAG search API
#[derive(Debug, Deserialize)]
struct AutoRagSearchResponse {
    #[serde(default)]
    result: Option<Vec<AutoRagMatch>>,
}

/// Individual match from AutoRAG
#[derive(Debug, Deserialize)]
struct AutoRagMatch {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

/// Error envelope returned on non-success statuses
#[derive(Debug, Deserialize)]
struct AutoRagErrorResponse {
    #[serde(default)]
    errors: Vec<AutoRagErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct AutoRagErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Pulls `errors[].message` out of an error body, joining multiple messages
fn extract_error_message(body: &str) -> Option<String> {
    let parsed: AutoRagErrorResponse = serde_json::from_str(body).ok()?;
    let messages: Vec<String> = parsed
        .errors
        .into_iter()
        .filter_map(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .collect();

    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

fn classify_transport_error(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection"
    } else if e.is_request() {
        "request build"
    } else if e.is_body() || e.is_decode() {
        "body"
    } else {
        "unknown"
    }
}

/// AutoRAG search provider
pub struct AutoRagSearchClient {
    client: Client,
    endpoint: String,
    api_token: String,
    max_results: usize,
    score_threshold: f64,
    autorag_database: String,
    entity_type: Option<String>,
}

impl std::fmt::Debug for AutoRagSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoRagSearchClient")
            .field("endpoint", &"***REDACTED***")
            .field("api_token", &"***REDACTED***")
            .field("max_results", &self.max_results)
            .field("score_threshold", &self.score_threshold)
            .field("autorag_database", &self.autorag_database)
            .field("entity_type", &self.entity_type)
            .finish()
    }
}

impl AutoRagSearchClient {
    /// Create a new AutoRAG search client
    ///
    /// Fails when the configuration is invalid or the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        config.validate()?;

        let endpoint = format!(
            "{}/accounts/{}/autorag/rags/{}/search",
            config.base_url.trim_end_matches('/'),
            config.account_id()?,
            config.index_name()?,
        );

        info!("Initializing AutoRAG search client");
        info!("  Max results: {}", config.max_results);
        info!("  Score threshold: {}", config.score_threshold);
        if let Some(entity_type) = &config.entity_type {
            info!("  Entity type filter: {entity_type}");
        }

        let mut builder = Client::builder();
        if let Some(timeout_secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| SearchError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_token: config.api_token()?.to_string(),
            max_results: config.max_results,
            score_threshold: config.score_threshold,
            autorag_database: config.autorag_database.clone(),
            entity_type: config.entity_type.clone(),
        })
    }

    /// Full URL of the search endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request<'a>(&'a self, query: &'a Query) -> AutoRagSearchRequest<'a> {
        AutoRagSearchRequest {
            query: query.as_str(),
            query_length: query.char_len(),
            max_results: self.max_results,
            score_threshold: self.score_threshold,
            autorag_database: &self.autorag_database,
            entity_type: self.entity_type.as_deref(),
        }
    }

    async fn execute(&self, query: &Query, trace: &mut SearchTrace) -> Result<MatchSet> {
        let request = self.build_request(query);

        debug!(
            "AutoRAG search: {} chars, max_results={}",
            request.query_length, request.max_results
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let error_kind = classify_transport_error(&e);
                warn!("AutoRAG search failed ({error_kind}): {e}");
                SearchError::Transport(format!("AutoRAG search failed ({error_kind}): {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!("Failed to read AutoRAG response body: {e}");
            SearchError::Transport(format!("Failed to read search response body: {e}"))
        })?;
        trace.record_response(status.as_u16(), &body);

        if !status.is_success() {
            let message = extract_error_message(&body).unwrap_or_else(|| {
                if body.trim().is_empty() {
                    "<empty response body>".to_string()
                } else {
                    body.clone()
                }
            });
            warn!("AutoRAG API error {status}: {message}");
            return Err(SearchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: AutoRagSearchResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse AutoRAG response: {e}");
            SearchError::Transport(format!("Failed to parse search response: {e}"))
        })?;

        let mut matches: MatchSet = parsed
            .result
            .unwrap_or_default()
            .into_iter()
            .map(|m| Match::new(m.text.unwrap_or_default(), m.score.unwrap_or_default()))
            .collect::<Vec<_>>()
            .into();

        if matches.len() > self.max_results {
            debug!(
                "AutoRAG returned {} matches, keeping the first {}",
                matches.len(),
                self.max_results
            );
            matches.truncate(self.max_results);
        }

        info!("AutoRAG search complete: {} matches", matches.len());
        Ok(matches)
    }
}

#[async_trait]
impl SearchClient for AutoRagSearchClient {
    async fn search(&self, query: &Query) -> Result<MatchSet> {
        self.search_traced(query).await.0
    }

    async fn search_traced(&self, query: &Query) -> (Result<MatchSet>, Option<SearchTrace>) {
        let payload = serde_json::to_value(self.build_request(query))
            .unwrap_or(serde_json::Value::Null);
        let mut trace = SearchTrace::new(self.endpoint.clone(), payload);
        let result = self.execute(query, &mut trace).await;
        (result, Some(trace))
    }
}
