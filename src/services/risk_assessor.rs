use tracing::warn;

use crate::config::RiskWeights;
use crate::domain::{MarketDataPoint, RiskLevel};

/// Minimum number of usable (return-producing) points the volatility
/// component needs before it trusts the sample; below this it degrades to
/// `0.0` rather than reporting a noisy estimate from a handful of points.
const MIN_USABLE_RETURNS: usize = 7;

/// Output of a single risk assessment: the combined score plus the level it
/// maps to.
#[derive(Debug, Clone, Copy)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

/// Combines three normalized `[0,1]` inputs into a weighted risk score and
/// maps it to a `RiskLevel`. `market_conditions` defaults to the
/// mid-point `0.5` when the caller has no external read on broad market
/// conditions, which is a neutral contribution rather than a penalty.
pub fn assess(
    volatility: f64,
    uncertainty: f64,
    market_conditions: Option<f64>,
    weights: &RiskWeights,
) -> RiskAssessment {
    let market_conditions = market_conditions.unwrap_or(0.5);

    let risk_score = (weights.volatility * volatility.clamp(0.0, 1.0)
        + weights.uncertainty * uncertainty.clamp(0.0, 1.0)
        + weights.market_conditions * market_conditions.clamp(0.0, 1.0))
    .clamp(0.0, 1.0);

    RiskAssessment {
        risk_score,
        risk_level: RiskLevel::from_score(risk_score),
    }
}

/// Normalizes a simple return's magnitude into a `[0,1]` volatility proxy by
/// saturating at `saturation` (a return magnitude past which volatility is
/// treated as maximal).
pub fn normalize_volatility(simple_return: f64, saturation: f64) -> f64 {
    if saturation <= 0.0 {
        warn!("non-positive volatility saturation {}, treating as maximal", saturation);
        return 1.0;
    }
    (simple_return.abs() / saturation).clamp(0.0, 1.0)
}

/// Computes the volatility component from an ascending-by-time market
/// history: the population standard deviation of simple returns, saturated
/// at `saturation`. Fewer than `MIN_USABLE_RETURNS` returns is treated as
/// insufficient data and degrades to `0.0` with a logged warning, rather
/// than reporting a volatility estimate built on too thin a sample.
pub fn volatility_component(history: &[MarketDataPoint], saturation: f64) -> f64 {
    let returns: Vec<f64> = history
        .windows(2)
        .filter_map(|pair| pair[1].simple_return(&pair[0]))
        .collect();

    if returns.len() < MIN_USABLE_RETURNS {
        warn!(
            "only {} usable return(s) in market history, defaulting volatility to 0.0",
            returns.len()
        );
        return 0.0;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    normalize_volatility(variance.sqrt(), saturation)
}

/// Assessment used whenever an upstream input (market data, sentiment,
/// prediction confidence) is unavailable or fails. Falling back to `Med`
/// rather than `Low` or `High` avoids silently understating or
/// overstating risk when the underlying signal is simply missing.
pub fn fallback_assessment() -> RiskAssessment {
    RiskAssessment {
        risk_score: 0.5,
        risk_level: RiskLevel::Med,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::{Duration as ChronoDuration, Utc};
    use std::str::FromStr;
    use uuid::Uuid;

    fn weights() -> RiskWeights {
        RiskWeights::default()
    }

    fn point(price: &str, days_ago: i64) -> MarketDataPoint {
        MarketDataPoint {
            id: Uuid::new_v4(),
            symbol: "ACME".to_string(),
            price: BigDecimal::from_str(price).unwrap(),
            volume: 1_000,
            observed_at: Utc::now() - ChronoDuration::days(days_ago),
            ingested_at: Utc::now(),
        }
    }

    #[test]
    fn fewer_than_seven_returns_defaults_to_zero() {
        let history: Vec<_> = (0..5).rev().map(|d| point("100.00", d)).collect();
        assert_eq!(volatility_component(&history, 0.10), 0.0);
    }

    #[test]
    fn flat_prices_yield_zero_volatility() {
        let history: Vec<_> = (0..10).rev().map(|d| point("100.00", d)).collect();
        assert_eq!(volatility_component(&history, 0.10), 0.0);
    }

    #[test]
    fn volatile_prices_saturate_to_one() {
        let mut history = Vec::new();
        for (i, d) in (0..10).rev().enumerate() {
            let price = if i % 2 == 0 { "100.00" } else { "50.00" };
            history.push(point(price, d));
        }
        assert_eq!(volatility_component(&history, 0.10), 1.0);
    }

    #[test]
    fn all_zero_inputs_yield_low_risk() {
        let assessment = assess(0.0, 0.0, Some(0.0), &weights());
        assert_eq!(assessment.risk_level, RiskLevel::Low);
    }

    #[test]
    fn all_max_inputs_yield_high_risk() {
        let assessment = assess(1.0, 1.0, Some(1.0), &weights());
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert!((assessment.risk_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_market_conditions_defaults_to_neutral() {
        let with_default = assess(0.2, 0.2, None, &weights());
        let with_explicit_half = assess(0.2, 0.2, Some(0.5), &weights());
        assert!((with_default.risk_score - with_explicit_half.risk_score).abs() < 1e-9);
    }

    #[test]
    fn fallback_is_medium_risk() {
        assert_eq!(fallback_assessment().risk_level, RiskLevel::Med);
    }

    #[test]
    fn volatility_saturates_past_threshold() {
        assert_eq!(normalize_volatility(0.20, 0.10), 1.0);
        assert!((normalize_volatility(0.05, 0.10) - 0.5).abs() < 1e-9);
    }
}
