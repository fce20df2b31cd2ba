use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Tier, TrackedUser, UserPreferences};

pub async fn preferences(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<UserPreferences>, sqlx::Error> {
    sqlx::query_as!(
        UserPreferences,
        r#"
        SELECT user_id, holding_period as "holding_period: _", risk_tolerance as "risk_tolerance: _", updated_at
        FROM user_preferences
        WHERE user_id = $1
        "#,
        user_id
    )
    .fetch_optional(pool)
    .await
}

/// Every user tracking at least one stock, with their tier and the full set
/// of symbols they track. One row per user, assembled from
/// `user_stock_tracking` joined against the account table maintained by the
/// out-of-scope signup flow.
pub async fn tracked_users(pool: &PgPool) -> Result<Vec<TrackedUser>, sqlx::Error> {
    let rows = sqlx::query!(
        r#"
        SELECT ust.user_id, a.tier as "tier: Tier", ust.symbol
        FROM user_stock_tracking ust
        JOIN accounts a ON a.user_id = ust.user_id
        ORDER BY ust.user_id
        "#
    )
    .fetch_all(pool)
    .await?;

    let mut users: Vec<TrackedUser> = Vec::new();
    for row in rows {
        match users.last_mut() {
            Some(last) if last.user_id == row.user_id => {
                last.tracked_symbols.push(row.symbol);
            }
            _ => users.push(TrackedUser {
                user_id: row.user_id,
                tier: row.tier,
                tracked_symbols: vec![row.symbol],
            }),
        }
    }

    Ok(users)
}

pub async fn tracked_symbol_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    let row = sqlx::query!(
        "SELECT COUNT(*) as \"count!\" FROM user_stock_tracking WHERE user_id = $1",
        user_id
    )
    .fetch_one(pool)
    .await?;

    Ok(row.count)
}
