use std::collections::HashMap;

use crate::domain::{clamp_score, SentimentObservation};

/// Result of combining one stock's recent per-source sentiment readings
/// into a single score.
#[derive(Debug, Clone)]
pub struct AggregatedSentiment {
    pub score: f64,
    pub source_count: usize,
    pub sources: Vec<String>,
}

/// Combines observations into one score. Defaults to an equal-weight mean;
/// passing a non-empty `weights` map (source name -> weight) switches to a
/// weighted mean, falling back to equal weight for any source missing from
/// the map. Returns `None` for an empty input — the caller decides what
/// "no sentiment data" means for its own flow.
pub fn aggregate(
    observations: &[SentimentObservation],
    weights: &HashMap<String, f64>,
) -> Option<AggregatedSentiment> {
    if observations.is_empty() {
        return None;
    }

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut sources = Vec::new();

    for obs in observations {
        let weight = weights.get(&obs.source).copied().unwrap_or(1.0);
        weighted_sum += obs.score * weight;
        total_weight += weight;
        if !sources.contains(&obs.source) {
            sources.push(obs.source.clone());
        }
    }

    let score = if total_weight > 0.0 {
        clamp_score(weighted_sum / total_weight)
    } else {
        0.0
    };

    Some(AggregatedSentiment {
        score,
        source_count: observations.len(),
        sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn obs(source: &str, score: f64) -> SentimentObservation {
        SentimentObservation {
            id: Uuid::new_v4(),
            symbol: "ACME".to_string(),
            source: source.to_string(),
            score,
            observed_at: Utc::now(),
            ingested_at: Utc::now(),
        }
    }

    #[test]
    fn empty_input_returns_none() {
        assert!(aggregate(&[], &HashMap::new()).is_none());
    }

    #[test]
    fn equal_weight_averages_by_default() {
        let observations = vec![obs("a", 1.0), obs("b", -0.5)];
        let result = aggregate(&observations, &HashMap::new()).unwrap();
        assert!((result.score - 0.25).abs() < 1e-9);
        assert_eq!(result.source_count, 2);
    }

    #[test]
    fn configured_weights_skew_the_mean() {
        let observations = vec![obs("a", 1.0), obs("b", -1.0)];
        let mut weights = HashMap::new();
        weights.insert("a".to_string(), 3.0);
        weights.insert("b".to_string(), 1.0);
        let result = aggregate(&observations, &weights).unwrap();
        assert!((result.score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn result_is_clamped_to_unit_range() {
        let observations = vec![obs("a", 1.0), obs("a", 1.0)];
        let result = aggregate(&observations, &HashMap::new()).unwrap();
        assert!(result.score <= 1.0);
    }
}
