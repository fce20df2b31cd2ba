use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One tracked equity out of the ~500-symbol universe.
///
/// Created and mutated only by the out-of-scope importer; this crate treats
/// the row as read-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Stock {
    pub symbol: String,
    pub company_name: String,
    pub sector: String,
    pub rank: Option<i32>,
}

impl Stock {
    /// `stocks.symbol` is expected to be 1-10 uppercase characters; this is
    /// enforced by the importer's unique index, not re-validated here.
    pub fn display_name(&self) -> &str {
        &self.company_name
    }
}
