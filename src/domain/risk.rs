use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Three-way risk classification. Variant order matches the gating order
/// (low before medium before high) used by the ranking's tertiary key and
/// by `RiskTolerance` gating.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Type)]
#[sqlx(type_name = "text")]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Med,
    High,
}

impl RiskLevel {
    /// Maps a `risk_score` in `[0,1]` to a level. Boundaries are inclusive
    /// on the low side: exactly 0.33 is `Low`, exactly 0.66 is `Med`.
    pub fn from_score(risk_score: f64) -> Self {
        if risk_score <= 0.33 {
            RiskLevel::Low
        } else if risk_score <= 0.66 {
            RiskLevel::Med
        } else {
            RiskLevel::High
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Med => write!(f, "med"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_mapping_is_inclusive_low_side() {
        assert_eq!(RiskLevel::from_score(0.33), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.66), RiskLevel::Med);
        assert_eq!(RiskLevel::from_score(0.6601), RiskLevel::High);
    }

    #[test]
    fn ordering_is_low_med_high() {
        assert!(RiskLevel::Low < RiskLevel::Med);
        assert!(RiskLevel::Med < RiskLevel::High);
    }
}
