use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Reserved source tag under which cross-source sentiment means are persisted.
pub const WEB_AGGREGATE_SOURCE: &str = "web_aggregate";

/// One (stock, source, instant) sentiment reading. Append-only, subject to
/// the (stock, source, observed_at-truncated-to-minute) idempotency key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SentimentObservation {
    pub id: Uuid,
    pub symbol: String,
    pub source: String,
    pub score: f64,
    pub observed_at: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
}

/// Truncate an instant to the minute, the idempotency granularity for
/// sentiment rows.
pub fn truncate_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(instant)
}

/// Clamp a raw sentiment score into the contract range. The aggregator and
/// every scraper must route scores through this before they are persisted.
pub fn clamp_score(score: f64) -> f64 {
    score.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn truncates_seconds_and_nanos() {
        let t = Utc.with_ymd_and_hms(2026, 7, 27, 14, 5, 47).unwrap();
        let truncated = truncate_to_minute(t);
        assert_eq!(truncated.minute(), 5);
        assert_eq!(truncated.second(), 0);
    }

    #[test]
    fn clamp_saturates_at_bounds() {
        assert_eq!(clamp_score(1.5), 1.0);
        assert_eq!(clamp_score(-1.5), -1.0);
        assert_eq!(clamp_score(0.3), 0.3);
    }
}
