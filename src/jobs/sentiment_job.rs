use std::collections::HashMap;

use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::Config;
use crate::db::{sentiment_queries, stock_queries};
use crate::domain::{clamp_score, SentimentObservation};
use crate::errors::AppError;
use crate::external::scraper::{ScrapeError, ScraperClient};
use crate::services::retry::{call_with_retries, Classification};
use crate::services::sentiment_aggregator;

/// Summary emitted at the end of one run: per-symbol progress plus a
/// per-source success tally, matching the `{processed_symbols,
/// per_source_success_counts, aggregate_writes}` log contract.
#[derive(Debug, Clone, Default)]
pub struct SentimentJobSummary {
    pub processed_symbols: usize,
    pub per_source_success_counts: HashMap<String, usize>,
    pub aggregate_writes: usize,
}

/// Per-symbol multi-source fan-out: scrape every configured source, persist
/// each reading, then persist the cross-source aggregate. A symbol with no
/// successful source produces no aggregate row — there is nothing to
/// average.
pub async fn run(
    pool: &sqlx::PgPool,
    scraper: &ScraperClient,
    config: &Config,
    clock: &dyn Clock,
) -> Result<SentimentJobSummary, AppError> {
    let stocks = stock_queries::list_all(pool).await.map_err(AppError::Db)?;
    let mut summary = SentimentJobSummary::default();
    let now = clock.now();

    for stock in stocks {
        let mut observations: Vec<SentimentObservation> = Vec::new();

        for profile in &config.source_profiles {
            let outcome = call_with_retries(
                "sentiment_scrape",
                2,
                classify,
                || scraper.collect(profile, &stock.symbol),
            )
            .await;

            match outcome {
                Ok(reading) => {
                    let score = clamp_score(reading.score);
                    match sentiment_queries::upsert(pool, &stock.symbol, reading.source, score, now)
                        .await
                    {
                        Ok(row) => {
                            *summary
                                .per_source_success_counts
                                .entry(reading.source.to_string())
                                .or_insert(0) += 1;
                            observations.push(row);
                        }
                        Err(e) => warn!(
                            stock = %stock.symbol,
                            source = profile.name,
                            error = %e,
                            "failed to persist sentiment observation"
                        ),
                    }
                }
                Err(ScrapeError::RobotsDisallowed) => {
                    info!(stock = %stock.symbol, source = profile.name, "skipped: robots.txt disallows path");
                }
                Err(error_class) => {
                    info!(
                        stock = %stock.symbol,
                        source = profile.name,
                        error_class = %error_class,
                        "sentiment scrape exhausted retries"
                    );
                }
            }
        }

        summary.processed_symbols += 1;

        if let Some(aggregated) =
            sentiment_aggregator::aggregate(&observations, &config.sentiment_source_weights)
        {
            match sentiment_queries::upsert_aggregate(pool, &stock.symbol, aggregated.score, now)
                .await
            {
                Ok(_) => summary.aggregate_writes += 1,
                Err(e) => warn!(
                    stock = %stock.symbol,
                    error = %e,
                    "failed to persist aggregate sentiment"
                ),
            }
        }
    }

    info!(
        processed_symbols = summary.processed_symbols,
        aggregate_writes = summary.aggregate_writes,
        per_source_success_counts = ?summary.per_source_success_counts,
        "sentiment job complete"
    );

    Ok(summary)
}

fn classify(error: &ScrapeError) -> Classification {
    match error {
        ScrapeError::Network(_) => Classification::Transient,
        ScrapeError::BadStatus(429) => Classification::Transient,
        ScrapeError::BadStatus(status) if *status >= 500 => Classification::Transient,
        ScrapeError::BadStatus(_) | ScrapeError::RobotsDisallowed => Classification::Permanent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_server_errors_and_429_as_transient() {
        assert!(matches!(classify(&ScrapeError::BadStatus(429)), Classification::Transient));
        assert!(matches!(classify(&ScrapeError::BadStatus(503)), Classification::Transient));
        assert!(matches!(
            classify(&ScrapeError::Network("timeout".into())),
            Classification::Transient
        ));
    }

    #[test]
    fn classifies_robots_and_other_4xx_as_permanent() {
        assert!(matches!(classify(&ScrapeError::RobotsDisallowed), Classification::Permanent));
        assert!(matches!(classify(&ScrapeError::BadStatus(404)), Classification::Permanent));
    }
}
