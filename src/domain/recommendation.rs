use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::risk::RiskLevel;

/// Trading signal. Closed, tagged variant — no stringly-typed signal value
/// is allowed past the prediction port.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "text")]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// A persisted (user, stock, run-instant) recommendation. Immutable after
/// write.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recommendation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub symbol: String,
    pub signal: Signal,
    pub confidence: f64,
    pub sentiment_score: f64,
    pub risk_level: RiskLevel,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
}

/// One (user, stock) pair under evaluation within a single recommendation
/// job run, carried through the candidate-filter-rank pipeline.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub symbol: String,
    pub signal: Signal,
    pub confidence: f64,
    pub sentiment_score: f64,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
}

/// Builds the human-readable explanation stub attached to a recommendation.
/// Deliberately terse — this is not a narrative generator, just a one-line
/// justification referencing the three inputs that drove the ranking.
pub fn explanation_stub(candidate: &Candidate) -> String {
    format!(
        "{:?} signal at {:.0}% confidence; aggregated sentiment {:+.2}; risk {}",
        candidate.signal,
        candidate.confidence * 100.0,
        candidate.sentiment_score,
        candidate.risk_level,
    )
}
