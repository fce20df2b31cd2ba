use std::collections::HashMap;
use std::time::Duration;

/// One scraping source. `url_template` must contain a single `{symbol}`
/// placeholder that gets replaced with the lowercased ticker, per the
/// scraper client's `collect` contract. `content_pattern` is a regex with a
/// single capture group bounding the source's article/content region —
/// parsing stays source-specific by letting each profile name its own
/// boundary instead of every source being scored off the same raw markup.
#[derive(Debug, Clone)]
pub struct SourceProfile {
    pub name: &'static str,
    pub domain: &'static str,
    pub url_template: &'static str,
    pub content_pattern: &'static str,
}

/// Typed, validated settings assembled from the environment and handed to
/// collaborators at construction. Loading secrets from a particular store
/// remains out of scope; this struct only models the values that cross the
/// boundary, plus a `from_env()` convenience so the binary in `main.rs` is
/// runnable standalone.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub market_data_api_key: String,
    pub market_data_calls_per_minute: u32,
    pub source_profiles: Vec<SourceProfile>,
    pub default_scrape_spacing: Duration,
    pub recommendation_daily_target: usize,
    pub recommendation_deadline: Duration,
    pub risk_weights: RiskWeights,
    pub volatility_saturation: f64,
    pub market_data_batch_size: usize,
    /// Per-source weights for the sentiment aggregator, keyed by
    /// `SourceProfile::name`. Empty means equal weighting, the default; the
    /// seam exists so a deployment can skew the cross-source mean without a
    /// code change.
    pub sentiment_source_weights: HashMap<String, f64>,
}

/// Tunable weights for the risk assessor's combined score.
/// Must sum to 1.0; `Config::validate` checks this.
#[derive(Debug, Clone, Copy)]
pub struct RiskWeights {
    pub volatility: f64,
    pub uncertainty: f64,
    pub market_conditions: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            volatility: 0.40,
            uncertainty: 0.40,
            market_conditions: 0.20,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL not set".to_string())?;

        let market_data_api_key = std::env::var("MARKET_DATA_API_KEY")
            .map_err(|_| "MARKET_DATA_API_KEY not set".to_string())?;

        let market_data_calls_per_minute = std::env::var("MARKET_DATA_CALLS_PER_MINUTE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let recommendation_daily_target = std::env::var("RECOMMENDATION_DAILY_TARGET")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let recommendation_deadline_secs = std::env::var("RECOMMENDATION_DEADLINE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60u64);

        let default_scrape_spacing_ms = std::env::var("DEFAULT_SCRAPE_SPACING_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(2_000u64);

        Ok(Self {
            database_url,
            market_data_api_key,
            market_data_calls_per_minute,
            source_profiles: default_source_profiles(),
            default_scrape_spacing: Duration::from_millis(default_scrape_spacing_ms),
            recommendation_daily_target,
            recommendation_deadline: Duration::from_secs(recommendation_deadline_secs),
            risk_weights: RiskWeights::default(),
            volatility_saturation: 0.10,
            market_data_batch_size: 50,
            sentiment_source_weights: HashMap::new(),
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.market_data_calls_per_minute == 0 {
            return Err("MARKET_DATA_CALLS_PER_MINUTE must be > 0".to_string());
        }
        if self.recommendation_daily_target == 0 {
            return Err("RECOMMENDATION_DAILY_TARGET must be > 0".to_string());
        }
        if self.market_data_batch_size == 0 {
            return Err("market_data_batch_size must be > 0".to_string());
        }
        let sum = self.risk_weights.volatility
            + self.risk_weights.uncertainty
            + self.risk_weights.market_conditions;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(format!("risk weights must sum to 1.0, got {sum}"));
        }
        Ok(())
    }

    /// Minimum spacing between calls to the market-data provider, derived
    /// from the per-minute budget.
    pub fn market_data_min_spacing(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.market_data_calls_per_minute as f64)
    }

    pub fn source_domains(&self) -> HashMap<&'static str, &'static str> {
        self.source_profiles
            .iter()
            .map(|p| (p.name, p.domain))
            .collect()
    }
}

fn default_source_profiles() -> Vec<SourceProfile> {
    vec![
        SourceProfile {
            name: "marketwatch",
            domain: "marketwatch.com",
            url_template: "https://www.marketwatch.com/investing/stock/{symbol}",
            content_pattern: r#"(?s)class="article__body"[^>]*>(.*?)<footer"#,
        },
        SourceProfile {
            name: "seekingalpha",
            domain: "seekingalpha.com",
            url_template: "https://seekingalpha.com/symbol/{symbol}",
            content_pattern: r#"(?s)id="content-rail"[^>]*>(.*?)</section>"#,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_risk_weights_sum_to_one() {
        let w = RiskWeights::default();
        assert!((w.volatility + w.uncertainty + w.market_conditions - 1.0).abs() < 1e-9);
    }

    #[test]
    fn validate_rejects_unbalanced_weights() {
        let mut cfg = Config {
            database_url: "postgres://".into(),
            market_data_api_key: "key".into(),
            market_data_calls_per_minute: 5,
            source_profiles: default_source_profiles(),
            default_scrape_spacing: Duration::from_secs(2),
            recommendation_daily_target: 10,
            recommendation_deadline: Duration::from_secs(60),
            risk_weights: RiskWeights::default(),
            volatility_saturation: 0.10,
            market_data_batch_size: 50,
            sentiment_source_weights: HashMap::new(),
        };
        cfg.risk_weights.volatility = 0.9;
        assert!(cfg.validate().is_err());
    }
}
