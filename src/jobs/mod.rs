//! The three hourly jobs the scheduler triggers.
//!
//! - `market_data_job` — batched price/volume fan-out over all stocks.
//! - `sentiment_job` — per-symbol multi-source scrape + aggregate.
//! - `recommendation_job` — per-user candidate scoring, filtering, ranking.
//!
//! Each job returns its own summary type rather than raising on partial
//! failure; the scheduler wraps every run in a `job_runs` row independent of
//! the per-symbol/per-source tallies the summaries carry.

pub mod market_data_job;
pub mod recommendation_job;
pub mod sentiment_job;
