use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{truncate_to_minute, SentimentObservation, WEB_AGGREGATE_SOURCE};

/// Upserts one reading, keyed by `(symbol, source, observed_at truncated to
/// the minute)`. A re-run of the sentiment job within the same minute
/// overwrites rather than duplicates the row.
pub async fn upsert(
    pool: &PgPool,
    symbol: &str,
    source: &str,
    score: f64,
    observed_at: DateTime<Utc>,
) -> Result<SentimentObservation, sqlx::Error> {
    let minute = truncate_to_minute(observed_at);

    sqlx::query_as!(
        SentimentObservation,
        r#"
        INSERT INTO sentiment_observations (id, symbol, source, score, observed_at, ingested_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        ON CONFLICT (symbol, source, observed_at)
        DO UPDATE SET score = EXCLUDED.score, ingested_at = NOW()
        RETURNING id, symbol, source, score, observed_at, ingested_at
        "#,
        Uuid::new_v4(),
        symbol,
        source,
        score,
        minute,
    )
    .fetch_one(pool)
    .await
}

/// All per-source readings (aggregate rows excluded) within the trailing
/// window, used as the aggregator's input.
pub async fn recent_by_source(
    pool: &PgPool,
    symbol: &str,
    since: DateTime<Utc>,
) -> Result<Vec<SentimentObservation>, sqlx::Error> {
    sqlx::query_as!(
        SentimentObservation,
        r#"
        SELECT id, symbol, source, score, observed_at, ingested_at
        FROM sentiment_observations
        WHERE symbol = $1 AND observed_at >= $2 AND source != $3
        ORDER BY observed_at ASC
        "#,
        symbol,
        since,
        WEB_AGGREGATE_SOURCE,
    )
    .fetch_all(pool)
    .await
}

pub async fn upsert_aggregate(
    pool: &PgPool,
    symbol: &str,
    score: f64,
    observed_at: DateTime<Utc>,
) -> Result<SentimentObservation, sqlx::Error> {
    upsert(pool, symbol, WEB_AGGREGATE_SOURCE, score, observed_at).await
}

pub async fn latest_aggregate(
    pool: &PgPool,
    symbol: &str,
) -> Result<Option<SentimentObservation>, sqlx::Error> {
    sqlx::query_as!(
        SentimentObservation,
        r#"
        SELECT id, symbol, source, score, observed_at, ingested_at
        FROM sentiment_observations
        WHERE symbol = $1 AND source = $2
        ORDER BY observed_at DESC
        LIMIT 1
        "#,
        symbol,
        WEB_AGGREGATE_SOURCE,
    )
    .fetch_optional(pool)
    .await
}
