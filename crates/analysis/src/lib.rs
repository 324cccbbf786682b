//! Compliance analysis of retrieved DRHP excerpts
//!
//! This crate turns a set of search matches into a review prompt and sends it
//! to a streaming language model. The model's answer arrives as a lazy
//! [`TextStream`]; [`AnalysisClient::analyze`] drains it into a single
//! [`AnalysisReport`](drhp_core::AnalysisReport), discarding partial text if
//! the stream fails.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use async_trait::async_trait;
use drhp_core::{AnalysisConfig, AnalysisPrompt, AnalysisReport};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

pub mod error;
mod gemini;
pub mod prompts;
mod sse;

pub use error::{AnalysisError, Result};
pub use gemini::GeminiAnalysisClient;
pub use prompts::build_prompt;

/// Finite, single-pass sequence of answer text chunks in arrival order
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Trait for streaming analysis providers
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Open a generation stream for the prompt
    async fn stream(&self, prompt: &AnalysisPrompt) -> Result<TextStream>;

    /// Generate the full report, failing closed on any stream error
    async fn analyze(&self, prompt: &AnalysisPrompt) -> Result<AnalysisReport> {
        let stream = self.stream(prompt).await?;
        collect_report(stream).await
    }
}

/// Drain a chunk stream into a report
///
/// The first error aborts collection and the text gathered so far is dropped.
pub async fn collect_report<S>(mut stream: S) -> Result<AnalysisReport>
where
    S: Stream<Item = Result<String>> + Unpin,
{
    let mut report = AnalysisReport::default();
    let mut chunks = 0usize;

    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => {
                report.push_chunk(&chunk);
                chunks += 1;
            }
            Err(e) => {
                warn!("Analysis stream failed after {chunks} chunks, discarding partial output: {e}");
                return Err(e);
            }
        }
    }

    debug!(
        "Analysis stream complete: {chunks} chunks, {} bytes",
        report.as_str().len()
    );
    Ok(report)
}

/// Create the analysis provider described by the configuration
pub fn create_analysis_client(config: &AnalysisConfig) -> Result<Arc<dyn AnalysisClient>> {
    Ok(Arc::new(GeminiAnalysisClient::new(config)?))
}
