//! DRHP compliance review orchestration
//!
//! One review is two strictly sequential remote calls: a semantic search for
//! relevant excerpts, then a streamed model analysis of those excerpts. Blank
//! queries and empty search results end the run early without an error.
//!
//! # Public API
//!
//! - [`ReviewPipeline`] - runs a review for one query
//! - [`ReviewOutcome`] - completed report or short-circuit notice
//! - [`ReviewObserver`] - progress hooks for front ends
//! - [`ReviewError`] - search or analysis failure

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod error;
mod observer;
mod pipeline;

pub use error::{Result, ReviewError};
pub use observer::{NoopObserver, ReviewObserver};
pub use pipeline::{ReviewOutcome, ReviewPipeline, EMPTY_QUERY_NOTICE, NO_RESULTS_NOTICE};
