mod market_data;
mod recommendation;
mod risk;
mod sentiment;
mod stock;
mod user;

pub use market_data::{MarketDataPoint, RawMarketPoint};
pub use recommendation::{explanation_stub, Candidate, Recommendation, Signal};
pub use risk::RiskLevel;
pub use sentiment::{clamp_score, truncate_to_minute, SentimentObservation, WEB_AGGREGATE_SOURCE};
pub use stock::Stock;
pub use user::{
    HoldingPeriod, RiskTolerance, Tier, TrackedUser, UserPreferences, UserStockTracking,
    FREE_TIER_STOCK_LIMIT,
};
