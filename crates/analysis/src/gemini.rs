//! Google Gemini streaming generation provider

use crate::error::{AnalysisError, Result};
use crate::sse::{SseDecoder, SseEvent};
use crate::{AnalysisClient, TextStream};
use async_trait::async_trait;
use drhp_core::{AnalysisConfig, AnalysisPrompt};
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use tracing::{debug, info, warn};

/// Request payload for `streamGenerateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    include_thoughts: bool,
    thinking_budget: i64,
}

/// One streamed `GenerateContentResponse`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Pulls `error.message` from an error body; the streaming endpoint may wrap it in an array
fn extract_error_message(body: &str) -> Option<String> {
    let envelope = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .or_else(|| {
            serde_json::from_str::<Vec<ApiErrorEnvelope>>(body)
                .ok()
                .and_then(|v| v.into_iter().next())
        })?;
    envelope.error.message.filter(|m| !m.trim().is_empty())
}

/// Turn one SSE event into a text chunk, an error, or nothing
fn parse_event(event: &SseEvent) -> Option<Result<String>> {
    if let Some(kind) = &event.event_type {
        debug!("Gemini stream event type: {kind}");
    }

    let data = event.data.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    let chunk: GenerateContentChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            return Some(Err(AnalysisError::Stream(format!(
                "Malformed stream chunk: {e}"
            ))))
        }
    };

    if let Some(error) = chunk.error {
        let message = error
            .message
            .unwrap_or_else(|| "unknown error".to_string());
        return Some(Err(AnalysisError::Stream(message)));
    }

    if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
        return Some(Err(AnalysisError::Stream(format!("Prompt blocked: {reason}"))));
    }

    let text: String = chunk
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|part| !part.thought)
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        None
    } else {
        Some(Ok(text))
    }
}

struct StreamState<S> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String>>,
    finished: bool,
}

/// Adapt a raw SSE byte stream into a stream of answer text chunks
///
/// The stream ends after the first error it yields.
pub(crate) fn text_stream<S, B, E>(bytes: S) -> TextStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = StreamState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                if item.is_err() {
                    state.pending.clear();
                    state.finished = true;
                }
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.feed(chunk.as_ref());
                    state.pending.extend(events.iter().filter_map(parse_event));
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(AnalysisError::Stream(format!(
                        "Failed to read response stream: {e}"
                    ))));
                }
                None => {
                    state.finished = true;
                    if let Some(event) = state.decoder.finish() {
                        state.pending.extend(parse_event(&event));
                    }
                }
            }
        }
    }))
}

/// Gemini streaming analysis provider
pub struct GeminiAnalysisClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    thinking_budget: i64,
}

impl std::fmt::Debug for GeminiAnalysisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiAnalysisClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"***REDACTED***")
            .field("model", &self.model)
            .field("thinking_budget", &self.thinking_budget)
            .finish()
    }
}

impl GeminiAnalysisClient {
    /// Create a new Gemini client
    ///
    /// Fails when the API key is missing or the HTTP client cannot be built.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let api_key = config.api_key()?.to_string();
        let endpoint = format!(
            "{}/v1beta/models/{}:streamGenerateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        info!("Initializing Gemini analysis client");
        info!("  Model: {}", config.model);
        info!("  Thinking budget: {}", config.thinking_budget);

        let mut builder = Client::builder();
        if let Some(timeout_secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| AnalysisError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model: config.model.clone(),
            thinking_budget: config.thinking_budget,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(&self, prompt: &'a AnalysisPrompt) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![TextPart {
                    text: prompt.as_str(),
                }],
            }],
            generation_config: GenerationConfig {
                thinking_config: ThinkingConfig {
                    include_thoughts: false,
                    thinking_budget: self.thinking_budget,
                },
            },
        }
    }
}

#[async_trait]
impl AnalysisClient for GeminiAnalysisClient {
    async fn stream(&self, prompt: &AnalysisPrompt) -> Result<TextStream> {
        let request = self.build_request(prompt);
        debug!(
            "Gemini request: model={}, prompt {} bytes",
            self.model,
            prompt.as_str().len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Gemini request failed: {e}");
                AnalysisError::Transport(format!("Gemini request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            let message = extract_error_message(&body).unwrap_or(body);
            warn!("Gemini API error {status}: {message}");
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        info!("Gemini stream opened for model {}", self.model);
        Ok(text_stream(response.bytes_stream()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type RawChunk = std::result::Result<&'static [u8], &'static str>;

    fn chunks(
        parts: Vec<std::result::Result<&'static str, &'static str>>,
    ) -> impl Stream<Item = RawChunk> + Send + 'static {
        futures::stream::iter(parts.into_iter().map(|p| p.map(str::as_bytes)))
    }

    fn text_event(text: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]})
        )
    }

    async fn drain(stream: TextStream) -> Vec<Result<String>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn test_text_stream_yields_chunks_in_order() {
        let body: &'static str = Box::leak(
            format!("{}{}{}", text_event("Red"), text_event(" flags:"), text_event(" none"))
                .into_boxed_str(),
        );
        let items = drain(text_stream(chunks(vec![Ok(body)]))).await;
        assert_eq!(
            items,
            vec![
                Ok("Red".to_string()),
                Ok(" flags:".to_string()),
                Ok(" none".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_text_stream_skips_thought_parts() {
        let body = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"hmm\",\"thought\":true},{\"text\":\"answer\"}]}}]}\n\n";
        let items = drain(text_stream(chunks(vec![Ok(body)]))).await;
        assert_eq!(items, vec![Ok("answer".to_string())]);
    }

    #[tokio::test]
    async fn test_text_stream_ignores_chunks_without_text() {
        let body = "data: {\"candidates\":[{\"finishReason\":\"STOP\"}],\"usageMetadata\":{}}\n\n";
        let items = drain(text_stream(chunks(vec![Ok(body)]))).await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_text_stream_stops_after_transport_error() {
        let first: &'static str = Box::leak(text_event("partial").into_boxed_str());
        let later: &'static str = Box::leak(text_event("never").into_boxed_str());
        let items = drain(text_stream(chunks(vec![
            Ok(first),
            Err("connection reset"),
            Ok(later),
        ])))
        .await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok("partial".to_string()));
        assert!(matches!(&items[1], Err(AnalysisError::Stream(msg)) if msg.contains("connection reset")));
    }

    #[tokio::test]
    async fn test_text_stream_error_event() {
        let body = "data: {\"error\":{\"code\":500,\"message\":\"internal\",\"status\":\"INTERNAL\"}}\n\n";
        let items = drain(text_stream(chunks(vec![Ok(body)]))).await;
        assert_eq!(items, vec![Err(AnalysisError::Stream("internal".to_string()))]);
    }

    #[tokio::test]
    async fn test_text_stream_malformed_event() {
        let items = drain(text_stream(chunks(vec![Ok("data: {not json\n\n")]))).await;
        assert!(matches!(&items[0], Err(AnalysisError::Stream(msg)) if msg.contains("Malformed")));
    }

    #[tokio::test]
    async fn test_text_stream_blocked_prompt() {
        let body = "data: {\"promptFeedback\":{\"blockReason\":\"SAFETY\"}}\n\n";
        let items = drain(text_stream(chunks(vec![Ok(body)]))).await;
        assert_eq!(
            items,
            vec![Err(AnalysisError::Stream("Prompt blocked: SAFETY".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_text_stream_flushes_unterminated_tail() {
        let body = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"end\"}]}}]}";
        let items = drain(text_stream(chunks(vec![Ok(body)]))).await;
        assert_eq!(items, vec![Ok("end".to_string())]);
    }

    #[test]
    fn test_extract_error_message_object_and_array() {
        let object = r#"{"error":{"code":400,"message":"API key not valid"}}"#;
        let array = r#"[{"error":{"code":400,"message":"API key not valid"}}]"#;
        assert_eq!(extract_error_message(object).as_deref(), Some("API key not valid"));
        assert_eq!(extract_error_message(array).as_deref(), Some("API key not valid"));
        assert_eq!(extract_error_message("nope"), None);
    }

    #[test]
    fn test_request_disables_thought_output() {
        let config = AnalysisConfig {
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        let client = GeminiAnalysisClient::new(&config).unwrap();
        let prompt = AnalysisPrompt::new("review this");
        let body = serde_json::to_value(client.build_request(&prompt)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "review this"}]}],
                "generationConfig": {
                    "thinkingConfig": {"includeThoughts": false, "thinkingBudget": -1}
                }
            })
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = AnalysisConfig {
            api_key: Some("very-secret-key".to_string()),
            ..Default::default()
        };
        let client = GeminiAnalysisClient::new(&config).unwrap();
        assert!(!format!("{client:?}").contains("very-secret-key"));
        assert_eq!(client.model(), "gemini-2.5-flash");
    }
}
