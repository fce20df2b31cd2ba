use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Candidate, Recommendation};

pub async fn insert(
    pool: &PgPool,
    user_id: Uuid,
    candidate: &Candidate,
    explanation: &str,
    created_at: DateTime<Utc>,
) -> Result<Recommendation, sqlx::Error> {
    sqlx::query_as!(
        Recommendation,
        r#"
        INSERT INTO recommendations
            (id, user_id, symbol, signal, confidence, sentiment_score, risk_level, explanation, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, user_id, symbol, signal as "signal: _", confidence, sentiment_score,
                  risk_level as "risk_level: _", explanation, created_at
        "#,
        Uuid::new_v4(),
        user_id,
        candidate.symbol,
        candidate.signal as _,
        candidate.confidence,
        candidate.sentiment_score,
        candidate.risk_level as _,
        explanation,
        created_at,
    )
    .fetch_one(pool)
    .await
}

pub async fn for_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<Recommendation>, sqlx::Error> {
    sqlx::query_as!(
        Recommendation,
        r#"
        SELECT id, user_id, symbol, signal as "signal: _", confidence, sentiment_score,
               risk_level as "risk_level: _", explanation, created_at
        FROM recommendations
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
        user_id,
        limit,
    )
    .fetch_all(pool)
    .await
}
