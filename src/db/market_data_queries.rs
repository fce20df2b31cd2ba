use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{MarketDataPoint, RawMarketPoint};

pub async fn insert(
    pool: &PgPool,
    symbol: &str,
    point: &RawMarketPoint,
) -> Result<MarketDataPoint, sqlx::Error> {
    sqlx::query_as!(
        MarketDataPoint,
        r#"
        INSERT INTO market_data_points (id, symbol, price, volume, observed_at, ingested_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING id, symbol, price, volume, observed_at, ingested_at
        "#,
        Uuid::new_v4(),
        symbol,
        point.price,
        point.volume,
        point.observed_at,
    )
    .fetch_one(pool)
    .await
}

pub async fn latest(pool: &PgPool, symbol: &str) -> Result<Option<MarketDataPoint>, sqlx::Error> {
    sqlx::query_as!(
        MarketDataPoint,
        r#"
        SELECT id, symbol, price, volume, observed_at, ingested_at
        FROM market_data_points
        WHERE symbol = $1
        ORDER BY observed_at DESC
        LIMIT 1
        "#,
        symbol
    )
    .fetch_optional(pool)
    .await
}

/// Points observed within the trailing window, oldest first, used to
/// compute a rolling volatility proxy.
pub async fn recent(
    pool: &PgPool,
    symbol: &str,
    since: DateTime<Utc>,
) -> Result<Vec<MarketDataPoint>, sqlx::Error> {
    sqlx::query_as!(
        MarketDataPoint,
        r#"
        SELECT id, symbol, price, volume, observed_at, ingested_at
        FROM market_data_points
        WHERE symbol = $1 AND observed_at >= $2
        ORDER BY observed_at ASC
        "#,
        symbol,
        since,
    )
    .fetch_all(pool)
    .await
}

/// Symbols whose latest observation predates `threshold`, or which have no
/// observation at all. Used by the market-data job's end-of-run staleness
/// report; a symbol with zero points is "stale" in the sense that matters
/// here (no usable current price), even though it never had a fresh one.
pub async fn symbols_stale_since(
    pool: &PgPool,
    all_symbols: &[String],
    threshold: DateTime<Utc>,
) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query!(
        r#"
        SELECT s.symbol
        FROM stocks s
        LEFT JOIN LATERAL (
            SELECT observed_at
            FROM market_data_points m
            WHERE m.symbol = s.symbol
            ORDER BY m.observed_at DESC
            LIMIT 1
        ) latest ON true
        WHERE s.symbol = ANY($1)
          AND (latest.observed_at IS NULL OR latest.observed_at < $2)
        "#,
        all_symbols,
        threshold,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.symbol).collect())
}
