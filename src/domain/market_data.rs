use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One (stock, instant) price/volume observation. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MarketDataPoint {
    pub id: Uuid,
    pub symbol: String,
    pub price: BigDecimal,
    pub volume: i64,
    pub observed_at: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
}

impl MarketDataPoint {
    /// Simple return against the previous point, `(p_t - p_t-1) / p_t-1`.
    pub fn simple_return(&self, previous: &MarketDataPoint) -> Option<f64> {
        use bigdecimal::ToPrimitive;
        let prev = previous.price.to_f64()?;
        let cur = self.price.to_f64()?;
        if prev <= 0.0 {
            return None;
        }
        Some((cur - prev) / prev)
    }
}

/// A validated price/volume reading straight off the wire, before it is
/// assigned a row id and ingestion timestamp.
#[derive(Debug, Clone)]
pub struct RawMarketPoint {
    pub price: BigDecimal,
    pub volume: i64,
    pub observed_at: DateTime<Utc>,
}
