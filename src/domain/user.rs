use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Holding-period preference, used by the recommendation job's preference
/// filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "text")]
#[serde(rename_all = "lowercase")]
pub enum HoldingPeriod {
    Daily,
    Weekly,
    Monthly,
}

/// Risk tolerance, gates the maximum `RiskLevel` a candidate may carry.
/// Variant order matches the gating order (low < medium < high).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, sqlx::Type)]
#[sqlx(type_name = "text")]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

/// Account tier. Only affects the tracking cap; ranking is identical
/// across tiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "text")]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Premium,
}

/// Hard cap on the number of stocks a free-tier user may track.
pub const FREE_TIER_STOCK_LIMIT: usize = 5;

/// 1:1 with a user. Mutated only by the out-of-scope API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPreferences {
    pub user_id: Uuid,
    pub holding_period: HoldingPeriod,
    pub risk_tolerance: RiskTolerance,
    pub updated_at: DateTime<Utc>,
}

/// A read-only view of a user as far as the recommendation job cares:
/// identity, tier, and the set of tracked symbols. Assembled by the
/// repository from `user_stock_tracking` plus whatever out-of-scope table
/// carries tier/account state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedUser {
    pub user_id: Uuid,
    pub tier: Tier,
    pub tracked_symbols: Vec<String>,
}

/// (user, stock, created) row. Enforces the free-tier cap.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserStockTracking {
    pub user_id: Uuid,
    pub symbol: String,
    pub created_at: DateTime<Utc>,
}
