use chrono::Duration as ChronoDuration;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::Config;
use crate::db::{market_data_queries, recommendation_queries, sentiment_queries, user_queries};
use crate::domain::{
    explanation_stub, Candidate, HoldingPeriod, RiskLevel, RiskTolerance, Signal, Tier,
    FREE_TIER_STOCK_LIMIT,
};
use crate::errors::AppError;
use crate::external::prediction_port::PredictionModel;
use crate::services::risk_assessor;

/// Multiplier applied to a candidate's confidence when no `web_aggregate`
/// sentiment row exists yet, per the recommendation job's "use 0.0 with a
/// lowered effective confidence" contract.
const MISSING_SENTIMENT_CONFIDENCE_FACTOR: f64 = 0.5;

/// Market history window used for the volatility component.
const VOLATILITY_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationJobSummary {
    pub users_processed: usize,
    pub recommendations_persisted: usize,
    pub deadline_exceeded: bool,
}

/// Per-user candidate scoring, preference/tier filtering, ranking, and
/// top-N persistence, bounded by a wall-clock deadline. Persistence of an
/// already-ranked per-user list always completes before the deadline check
/// for the *next* user runs.
pub async fn run(
    pool: &sqlx::PgPool,
    prediction_model: &dyn PredictionModel,
    config: &Config,
    clock: &dyn Clock,
) -> Result<RecommendationJobSummary, AppError> {
    let users = user_queries::tracked_users(pool).await.map_err(AppError::Db)?;
    let started_at = clock.now();
    let deadline = ChronoDuration::from_std(config.recommendation_deadline)
        .unwrap_or_else(|_| ChronoDuration::seconds(60));

    let mut summary = RecommendationJobSummary::default();

    for user in users {
        if clock.now() - started_at > deadline {
            if !summary.deadline_exceeded {
                warn!(
                    users_processed = summary.users_processed,
                    "recommendation job deadline exceeded, halting"
                );
            }
            summary.deadline_exceeded = true;
            break;
        }

        let Some(preferences) = user_queries::preferences(pool, user.user_id)
            .await
            .map_err(AppError::Db)?
        else {
            warn!(user_id = %user.user_id, "no preferences on file, skipping user");
            continue;
        };

        if user.tier == Tier::Free {
            let tracked_count = user_queries::tracked_symbol_count(pool, user.user_id)
                .await
                .map_err(AppError::Db)?;
            if tracked_count > FREE_TIER_STOCK_LIMIT as i64 {
                warn!(
                    user_id = %user.user_id,
                    tracked = tracked_count,
                    limit = FREE_TIER_STOCK_LIMIT,
                    "free-tier user exceeds tracking cap, invariant violated upstream"
                );
            }
        }

        let mut candidates = Vec::new();
        for symbol in &user.tracked_symbols {
            if let Some(candidate) =
                build_candidate(pool, prediction_model, config, clock, symbol).await
            {
                candidates.push(candidate);
            }
        }

        let filtered = filter_candidates(candidates, &preferences.holding_period, &preferences.risk_tolerance);
        let ranked = rank(filtered, &preferences.holding_period);
        let truncated: Vec<Candidate> =
            ranked.into_iter().take(config.recommendation_daily_target).collect();

        let created_at = clock.now();
        for candidate in &truncated {
            let explanation = explanation_stub(candidate);
            match recommendation_queries::insert(pool, user.user_id, candidate, &explanation, created_at)
                .await
            {
                Ok(_) => summary.recommendations_persisted += 1,
                Err(e) => warn!(
                    user_id = %user.user_id,
                    stock = %candidate.symbol,
                    error = %e,
                    "failed to persist recommendation"
                ),
            }
        }

        summary.users_processed += 1;
    }

    info!(
        users_processed = summary.users_processed,
        recommendations_persisted = summary.recommendations_persisted,
        deadline_exceeded = summary.deadline_exceeded,
        "recommendation job complete"
    );

    Ok(summary)
}

/// Runs one candidate through prediction, sentiment enrichment, and risk
/// assessment. Returns `None` when the prediction is outside contract — the
/// candidate is dropped, not defaulted.
async fn build_candidate(
    pool: &sqlx::PgPool,
    prediction_model: &dyn PredictionModel,
    config: &Config,
    clock: &dyn Clock,
    symbol: &str,
) -> Option<Candidate> {
    let aggregate = match sentiment_queries::latest_aggregate(pool, symbol).await {
        Ok(obs) => obs,
        Err(e) => {
            warn!(stock = symbol, error = %e, "failed to read aggregate sentiment, treating as missing");
            None
        }
    };
    let sentiment_score = aggregate.as_ref().map(|o| o.score).unwrap_or(0.0);

    let prediction = match prediction_model.predict(symbol, sentiment_score).await {
        Ok(p) => p,
        Err(e) => {
            info!(stock = symbol, error = %e, "prediction unavailable, dropping candidate");
            return None;
        }
    };

    if !(0.0..=1.0).contains(&prediction.confidence) {
        warn!(stock = symbol, confidence = prediction.confidence, "invalid confidence, dropping candidate");
        return None;
    }

    let effective_confidence = if aggregate.is_some() {
        prediction.confidence
    } else {
        info!(stock = symbol, "no web_aggregate sentiment, using neutral score");
        prediction.confidence * MISSING_SENTIMENT_CONFIDENCE_FACTOR
    };

    let since = clock.now() - ChronoDuration::days(VOLATILITY_WINDOW_DAYS);
    let assessment = match market_data_queries::recent(pool, symbol, since).await {
        Ok(history) => {
            let volatility = risk_assessor::volatility_component(&history, config.volatility_saturation);
            let uncertainty = 1.0 - effective_confidence;
            risk_assessor::assess(volatility, uncertainty, None, &config.risk_weights)
        }
        Err(e) => {
            warn!(stock = symbol, error = %e, "risk assessment failed, degrading to MED");
            risk_assessor::fallback_assessment()
        }
    };

    Some(Candidate {
        symbol: symbol.to_string(),
        signal: prediction.signal,
        confidence: effective_confidence,
        sentiment_score,
        risk_level: assessment.risk_level,
        risk_score: assessment.risk_score,
    })
}

/// Applies the holding-period volatility-band filter and the risk-tolerance
/// ceiling. A candidate survives only if both admit it.
fn filter_candidates(
    candidates: Vec<Candidate>,
    holding_period: &HoldingPeriod,
    risk_tolerance: &RiskTolerance,
) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| holding_period_admits(holding_period, c.risk_level))
        .filter(|c| risk_tolerance_admits(risk_tolerance, c.risk_level))
        .collect()
}

fn holding_period_admits(holding_period: &HoldingPeriod, risk_level: RiskLevel) -> bool {
    match holding_period {
        HoldingPeriod::Daily => matches!(risk_level, RiskLevel::Low | RiskLevel::Med),
        HoldingPeriod::Weekly => true,
        HoldingPeriod::Monthly => true,
    }
}

fn risk_tolerance_admits(risk_tolerance: &RiskTolerance, risk_level: RiskLevel) -> bool {
    match risk_tolerance {
        RiskTolerance::Low => matches!(risk_level, RiskLevel::Low),
        RiskTolerance::Medium => matches!(risk_level, RiskLevel::Low | RiskLevel::Med),
        RiskTolerance::High => true,
    }
}

/// Orients a candidate's sentiment so the ranking rewards sentiment that
/// agrees with the signal: positive sentiment favors a `Buy`, negative
/// sentiment favors a `Sell`. `Hold` has no directional preference, so it
/// contributes nothing to the secondary key and ties fall through to the
/// risk-level tertiary key.
fn signed_sentiment(candidate: &Candidate) -> f64 {
    match candidate.signal {
        Signal::Buy => candidate.sentiment_score,
        Signal::Sell => -candidate.sentiment_score,
        Signal::Hold => 0.0,
    }
}

/// Tertiary-key ordinal for a risk level. `Weekly` holders prefer `Med` —
/// the holding period's volatility heuristic rates a medium-risk pick as
/// the best fit for a week-long hold, unlike `Daily`/`Monthly`, which rank
/// strictly ascending (`Low` before `Med` before `High`).
fn risk_rank(risk_level: RiskLevel, holding_period: &HoldingPeriod) -> u8 {
    match holding_period {
        HoldingPeriod::Weekly => match risk_level {
            RiskLevel::Med => 0,
            RiskLevel::Low => 1,
            RiskLevel::High => 2,
        },
        HoldingPeriod::Daily | HoldingPeriod::Monthly => match risk_level {
            RiskLevel::Low => 0,
            RiskLevel::Med => 1,
            RiskLevel::High => 2,
        },
    }
}

/// Primary: confidence descending. Secondary: signed sentiment descending.
/// Tertiary: risk level ordinal per `risk_rank`, holding-period-aware.
fn rank(mut candidates: Vec<Candidate>, holding_period: &HoldingPeriod) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                signed_sentiment(b)
                    .partial_cmp(&signed_sentiment(a))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| {
                risk_rank(a.risk_level, holding_period).cmp(&risk_rank(b.risk_level, holding_period))
            })
    });
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(signal: Signal, confidence: f64, sentiment: f64, risk: RiskLevel) -> Candidate {
        Candidate {
            symbol: "ACME".to_string(),
            signal,
            confidence,
            sentiment_score: sentiment,
            risk_level: risk,
            risk_score: 0.5,
        }
    }

    #[test]
    fn daily_holding_period_excludes_high_risk() {
        assert!(holding_period_admits(&HoldingPeriod::Daily, RiskLevel::Med));
        assert!(!holding_period_admits(&HoldingPeriod::Daily, RiskLevel::High));
    }

    #[test]
    fn monthly_holding_period_admits_everything() {
        assert!(holding_period_admits(&HoldingPeriod::Monthly, RiskLevel::High));
    }

    #[test]
    fn low_risk_tolerance_admits_only_low() {
        assert!(risk_tolerance_admits(&RiskTolerance::Low, RiskLevel::Low));
        assert!(!risk_tolerance_admits(&RiskTolerance::Low, RiskLevel::Med));
    }

    #[test]
    fn ranking_is_confidence_then_sentiment_then_risk() {
        let candidates = vec![
            candidate(Signal::Buy, 0.6, 0.1, RiskLevel::Low),
            candidate(Signal::Buy, 0.9, -0.2, RiskLevel::High),
            candidate(Signal::Buy, 0.9, 0.5, RiskLevel::Med),
        ];
        let ranked = rank(candidates, &HoldingPeriod::Monthly);
        assert!((ranked[0].confidence - 0.9).abs() < 1e-9);
        assert!((ranked[0].sentiment_score - 0.5).abs() < 1e-9);
        assert!((ranked[2].confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn sell_signal_benefits_from_negative_sentiment() {
        let a = candidate(Signal::Sell, 0.8, -0.9, RiskLevel::Low);
        let b = candidate(Signal::Sell, 0.8, 0.9, RiskLevel::Low);
        let ranked = rank(vec![b, a], &HoldingPeriod::Monthly);
        assert!((ranked[0].sentiment_score + 0.9).abs() < 1e-9);
    }

    #[test]
    fn daily_and_monthly_rank_risk_ascending() {
        let low = candidate(Signal::Buy, 0.7, 0.0, RiskLevel::Low);
        let med = candidate(Signal::Buy, 0.7, 0.0, RiskLevel::Med);
        let high = candidate(Signal::Buy, 0.7, 0.0, RiskLevel::High);

        let ranked = rank(vec![high.clone(), med.clone(), low.clone()], &HoldingPeriod::Daily);
        assert_eq!(ranked[0].risk_level, RiskLevel::Low);
        assert_eq!(ranked[1].risk_level, RiskLevel::Med);
        assert_eq!(ranked[2].risk_level, RiskLevel::High);

        let ranked = rank(vec![high, med, low], &HoldingPeriod::Monthly);
        assert_eq!(ranked[0].risk_level, RiskLevel::Low);
        assert_eq!(ranked[2].risk_level, RiskLevel::High);
    }

    #[test]
    fn weekly_holding_period_prefers_med_risk() {
        let low = candidate(Signal::Buy, 0.7, 0.0, RiskLevel::Low);
        let med = candidate(Signal::Buy, 0.7, 0.0, RiskLevel::Med);
        let high = candidate(Signal::Buy, 0.7, 0.0, RiskLevel::High);

        let ranked = rank(vec![low, high, med], &HoldingPeriod::Weekly);
        assert_eq!(ranked[0].risk_level, RiskLevel::Med);
        assert_eq!(ranked[1].risk_level, RiskLevel::Low);
        assert_eq!(ranked[2].risk_level, RiskLevel::High);
    }

    #[test]
    fn filter_applies_both_gates() {
        let candidates = vec![
            candidate(Signal::Buy, 0.8, 0.2, RiskLevel::Low),
            candidate(Signal::Buy, 0.8, 0.2, RiskLevel::High),
        ];
        let filtered = filter_candidates(candidates, &HoldingPeriod::Monthly, &RiskTolerance::Low);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].risk_level, RiskLevel::Low);
    }
}
