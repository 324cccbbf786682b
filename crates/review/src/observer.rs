//! Progress hooks for front ends

use drhp_core::{MatchSet, Query};
use drhp_retrieval::SearchTrace;

/// Receives pipeline progress as it happens
///
/// All methods default to doing nothing. Nothing from the analysis stream is
/// forwarded, so an observer never sees output from a failed analysis.
pub trait ReviewObserver: Send {
    fn search_started(&mut self, _query: &Query) {}

    /// Wire-level record of the search exchange, sent whether or not it succeeded
    fn search_traced(&mut self, _trace: &SearchTrace) {}

    fn matches_retrieved(&mut self, _matches: &MatchSet) {}

    fn analysis_started(&mut self) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ReviewObserver for NoopObserver {}
