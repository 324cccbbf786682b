//! Semantic search over the managed DRHP document index
//!
//! This crate wraps the remote retrieval service behind the [`SearchClient`]
//! trait. The service does all ranking and threshold filtering; matches come
//! back in its order and are only capped at the configured maximum here.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use async_trait::async_trait;
use drhp_core::{MatchSet, Query, SearchConfig};
use std::sync::Arc;

mod autorag;
pub mod error;
mod trace;

pub use autorag::AutoRagSearchClient;
pub use error::{Result, SearchError};
pub use trace::SearchTrace;

/// Trait for semantic search providers
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run a single search request
    ///
    /// An empty [`MatchSet`] is a successful outcome. No retries are attempted.
    async fn search(&self, query: &Query) -> Result<MatchSet>;

    /// Same as [`SearchClient::search`], also returning what went over the wire
    ///
    /// Providers without a wire representation return `None` for the trace.
    async fn search_traced(&self, query: &Query) -> (Result<MatchSet>, Option<SearchTrace>) {
        (self.search(query).await, None)
    }
}

/// Create the search provider described by the configuration
pub fn create_search_client(config: &SearchConfig) -> Result<Arc<dyn SearchClient>> {
    Ok(Arc::new(AutoRagSearchClient::new(config)?))
}
