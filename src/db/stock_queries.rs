use sqlx::PgPool;

use crate::domain::Stock;

/// All stocks in the tracked universe, ordered by rank where known.
pub async fn list_all(pool: &PgPool) -> Result<Vec<Stock>, sqlx::Error> {
    sqlx::query_as!(
        Stock,
        r#"
        SELECT symbol, company_name, sector, rank
        FROM stocks
        ORDER BY rank NULLS LAST, symbol
        "#
    )
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, symbol: &str) -> Result<Option<Stock>, sqlx::Error> {
    sqlx::query_as!(
        Stock,
        r#"
        SELECT symbol, company_name, sector, rank
        FROM stocks
        WHERE symbol = $1
        "#,
        symbol
    )
    .fetch_optional(pool)
    .await
}
