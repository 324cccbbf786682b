//! Search → prompt → analysis pipeline for a single query

use crate::error::Result;
use crate::observer::{NoopObserver, ReviewObserver};
use drhp_analysis::{build_prompt, create_analysis_client, AnalysisClient};
use drhp_core::{AnalysisReport, Config, MatchSet, Query};
use drhp_retrieval::{create_search_client, SearchClient};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Shown when the submitted query is blank
pub const EMPTY_QUERY_NOTICE: &str = "Please enter a query to begin.";

/// Shown when the search returns no matches
pub const NO_RESULTS_NOTICE: &str = "No relevant results found.";

/// How a review run ended when no remote call failed
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    /// The query was blank; nothing was sent
    EmptyQuery,
    /// The search succeeded with zero matches; analysis was skipped
    NoResults,
    /// Both calls succeeded
    Completed {
        matches: MatchSet,
        report: AnalysisReport,
    },
}

impl ReviewOutcome {
    /// Notice for the short-circuit outcomes
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::EmptyQuery => Some(EMPTY_QUERY_NOTICE),
            Self::NoResults => Some(NO_RESULTS_NOTICE),
            Self::Completed { .. } => None,
        }
    }
}

/// Runs one review per call; holds no per-request state between calls
pub struct ReviewPipeline {
    search: Arc<dyn SearchClient>,
    analysis: Arc<dyn AnalysisClient>,
}

impl std::fmt::Debug for ReviewPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewPipeline")
            .field("search", &"<SearchClient>")
            .field("analysis", &"<AnalysisClient>")
            .finish()
    }
}

impl ReviewPipeline {
    pub fn new(search: Arc<dyn SearchClient>, analysis: Arc<dyn AnalysisClient>) -> Self {
        Self { search, analysis }
    }

    /// Build both clients from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let search = create_search_client(&config.search)?;
        let analysis = create_analysis_client(&config.analysis)?;
        Ok(Self::new(search, analysis))
    }

    pub async fn run(&self, raw_query: &str) -> Result<ReviewOutcome> {
        self.run_observed(raw_query, &mut NoopObserver).await
    }

    /// Execute a review, reporting progress to `observer`
    ///
    /// The analysis call only starts once the search has returned at least one
    /// match. Any remote failure stops the run and no partial report is returned.
    pub async fn run_observed(
        &self,
        raw_query: &str,
        observer: &mut dyn ReviewObserver,
    ) -> Result<ReviewOutcome> {
        let Some(query) = Query::new(raw_query) else {
            debug!("Blank query submitted, skipping search");
            return Ok(ReviewOutcome::EmptyQuery);
        };

        let start_time = Instant::now();
        info!("Searching document index");
        observer.search_started(&query);

        let (result, trace) = self.search.search_traced(&query).await;
        if let Some(trace) = &trace {
            observer.search_traced(trace);
        }
        let matches = result.map_err(|e| {
            warn!("Review halted by search failure: {e}");
            e
        })?;

        if matches.is_empty() {
            info!("No matches for query; skipping analysis");
            return Ok(ReviewOutcome::NoResults);
        }

        info!("Retrieved {} relevant documents", matches.len());
        observer.matches_retrieved(&matches);

        let prompt = build_prompt(&matches);
        debug!("Analysis prompt: {} bytes", prompt.as_str().len());

        info!("Analyzing excerpts");
        observer.analysis_started();
        let report = self.analysis.analyze(&prompt).await.map_err(|e| {
            warn!("Review halted by analysis failure: {e}");
            e
        })?;

        info!(
            "Review complete in {} ms ({} bytes of report)",
            start_time.elapsed().as_millis(),
            report.as_str().len()
        );

        Ok(ReviewOutcome::Completed { matches, report })
    }
}
