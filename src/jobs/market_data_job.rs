use bigdecimal::BigDecimal;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::Config;
use crate::db::{market_data_queries, stock_queries};
use crate::errors::AppError;
use crate::external::market_data_provider::{MarketDataError, MarketDataProvider};
use crate::services::retry::{call_with_retries, Classification};

/// Summary emitted at the end of one run, matching the `{attempted,
/// succeeded, failed, stale_remaining}` log contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketDataJobSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub stale_remaining: usize,
}

/// Batched fan-out over every tracked symbol: one quote fetch per symbol,
/// persisted on success, tallied on failure. Per-symbol failures never stop
/// the job — partial success is the expected outcome, not an error.
pub async fn run(
    pool: &sqlx::PgPool,
    provider: &dyn MarketDataProvider,
    config: &Config,
    clock: &dyn Clock,
) -> Result<MarketDataJobSummary, AppError> {
    let stocks = stock_queries::list_all(pool).await.map_err(AppError::Db)?;
    let symbols: Vec<String> = stocks.into_iter().map(|s| s.symbol).collect();

    let mut summary = MarketDataJobSummary::default();

    for batch in symbols.chunks(config.market_data_batch_size) {
        for (batch_index, symbol) in batch.iter().enumerate() {
            summary.attempted += 1;

            let outcome = call_with_retries(
                "market_data_fetch",
                2,
                classify,
                || provider.fetch_quote(symbol),
            )
            .await;

            match outcome {
                Ok(raw) => {
                    if raw.price <= BigDecimal::from(0) || raw.volume < 0 {
                        warn!(stock = %symbol, "rejected out-of-contract quote");
                        summary.failed += 1;
                        continue;
                    }

                    match market_data_queries::insert(pool, symbol, &raw).await {
                        Ok(_) => summary.succeeded += 1,
                        Err(e) => {
                            warn!(stock = %symbol, error = %e, "failed to persist market data point");
                            summary.failed += 1;
                        }
                    }
                }
                Err(error_class) => {
                    info!(
                        stock = %symbol,
                        batch_index,
                        error_class = %error_class,
                        "market data fetch exhausted retries"
                    );
                    summary.failed += 1;
                }
            }
        }
    }

    let threshold = clock.now() - chrono::Duration::hours(1);
    match market_data_queries::symbols_stale_since(pool, &symbols, threshold).await {
        Ok(stale) => {
            summary.stale_remaining = stale.len();
            if !stale.is_empty() {
                warn!(stale = ?stale, "symbols with no fresh market data");
            }
        }
        Err(e) => warn!(error = %e, "failed to query stale symbols"),
    }

    info!(
        attempted = summary.attempted,
        succeeded = summary.succeeded,
        failed = summary.failed,
        stale_remaining = summary.stale_remaining,
        "market data job complete"
    );

    Ok(summary)
}

fn classify(error: &MarketDataError) -> Classification {
    match error {
        MarketDataError::RateLimited
        | MarketDataError::ServerError(_)
        | MarketDataError::Network(_) => Classification::Transient,
        MarketDataError::BadResponse(_) | MarketDataError::Parse(_) | MarketDataError::NotFound => {
            Classification::Permanent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rate_limit_and_network_as_transient() {
        assert!(matches!(
            classify(&MarketDataError::RateLimited),
            Classification::Transient
        ));
        assert!(matches!(
            classify(&MarketDataError::Network("boom".into())),
            Classification::Transient
        ));
        assert!(matches!(
            classify(&MarketDataError::ServerError(503)),
            Classification::Transient
        ));
    }

    #[test]
    fn classifies_parse_and_not_found_as_permanent() {
        assert!(matches!(
            classify(&MarketDataError::Parse("bad".into())),
            Classification::Permanent
        ));
        assert!(matches!(
            classify(&MarketDataError::NotFound),
            Classification::Permanent
        ));
    }
}
