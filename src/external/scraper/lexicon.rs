/// Deterministic keyword-weighted scorer. Not a model — a fixed lexicon so
/// the same page text always yields the same score, which the aggregator
/// and idempotency key both rely on.
const POSITIVE_TERMS: &[(&str, f64)] = &[
    ("upgrade", 0.6),
    ("beat expectations", 0.8),
    ("beats expectations", 0.8),
    ("outperform", 0.6),
    ("strong buy", 0.9),
    ("bullish", 0.5),
    ("record revenue", 0.7),
    ("record profit", 0.7),
    ("raises guidance", 0.6),
    ("surge", 0.4),
    ("rally", 0.4),
];

const NEGATIVE_TERMS: &[(&str, f64)] = &[
    ("downgrade", -0.6),
    ("miss expectations", -0.8),
    ("misses expectations", -0.8),
    ("underperform", -0.6),
    ("strong sell", -0.9),
    ("bearish", -0.5),
    ("lawsuit", -0.4),
    ("investigation", -0.5),
    ("cuts guidance", -0.6),
    ("plunge", -0.4),
    ("selloff", -0.4),
];

/// Scores a page's text in `[-1, 1]` as the weighted mean of every lexicon
/// term found, case-insensitively. Returns `0.0` for text with no matches —
/// silence is treated as neutral, not missing data.
pub fn score_text(text: &str) -> f64 {
    let lowered = text.to_lowercase();

    let mut weighted_sum = 0.0;
    let mut matches = 0;

    for (term, weight) in POSITIVE_TERMS.iter().chain(NEGATIVE_TERMS.iter()) {
        let count = lowered.matches(term).count();
        if count > 0 {
            weighted_sum += weight * count as f64;
            matches += count;
        }
    }

    if matches == 0 {
        return 0.0;
    }

    (weighted_sum / matches as f64).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_text_scores_zero() {
        assert_eq!(score_text("the company released its quarterly filing"), 0.0);
    }

    #[test]
    fn positive_terms_score_positive() {
        let score = score_text("Analysts upgrade the stock after it beats expectations");
        assert!(score > 0.0);
    }

    #[test]
    fn negative_terms_score_negative() {
        let score = score_text("Firm issues downgrade amid lawsuit and investigation");
        assert!(score < 0.0);
    }

    #[test]
    fn mixed_terms_partially_cancel() {
        let score = score_text("upgrade followed by downgrade");
        assert!(score.abs() < 0.3);
    }
}
