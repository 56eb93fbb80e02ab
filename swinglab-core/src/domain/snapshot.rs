//! Macro market snapshot and the regime decision derived from it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Macro state resolved by the data layer for a single as-of date.
///
/// Immutable per pipeline run. All fields must be finite; the regime gate
/// treats a NaN or infinite field as a fatal precondition violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub as_of: NaiveDate,
    /// 20-day moving average of the advancing/declining issue ratio, in
    /// percent (100 = as many advancers as decliners).
    pub breadth_ratio: f64,
    /// Volatility index level for the as-of session.
    pub vol_index: f64,
    /// Volatility index level for the prior session.
    pub vol_index_prev: f64,
    /// Benchmark index close.
    pub index_level: f64,
    /// 20-day moving average of the benchmark index close.
    pub index_ma20: f64,
    /// 20-day Pearson correlation between the FX rate and the index
    /// (daily returns). Positive values mean the historical inverse
    /// relationship has flipped.
    pub fx_index_corr: f64,
}

/// Market regime label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketRegime {
    Crash,
    Bear,
    Normal,
    Bull,
}

impl MarketRegime {
    /// CRASH and BEAR both terminate the pipeline.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MarketRegime::Crash | MarketRegime::Bear)
    }
}

/// Outcome of the regime gate. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeDecision {
    pub regime: MarketRegime,
    /// Bet-size multiplier in [0.0, 1.0]. Zero only for CRASH/BEAR.
    pub bet_multiplier: f64,
    /// Snapshot echo for the report.
    pub breadth_ratio: f64,
    pub vol_index: f64,
    pub fx_index_corr: f64,
    /// Human-readable justification, one clause per rule that fired.
    pub reason: String,
}

impl RegimeDecision {
    /// Whether later phases may run at all.
    pub fn is_tradable(&self) -> bool {
        !self.regime.is_terminal() && self.bet_multiplier > 0.0
    }
}
