//! Sector universe inputs and the screened sector candidates.

use serde::{Deserialize, Serialize};

use super::Bar;

/// One sector constituent with enough history for the primary filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorMember {
    pub ticker: String,
    /// Market capitalisation, account currency. Used only for ordering
    /// (top-3-by-cap drive the trickle-down confirmation).
    pub market_cap: f64,
    pub bars: Vec<Bar>,
}

/// Per-sector OHLCV series plus its constituents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorSeries {
    pub code: String,
    pub name: String,
    pub bars: Vec<Bar>,
    pub members: Vec<SectorMember>,
}

/// Everything the sector screen consumes, resolved for one as-of date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorUniverse {
    /// Benchmark index series covering at least the 3-month window.
    pub benchmark: Vec<Bar>,
    pub sectors: Vec<SectorSeries>,
}

/// A sector retained by the screen, with its derived candidate tickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorCandidate {
    pub code: String,
    pub name: String,
    /// 0.5·α(1w) + 0.3·α(1m) + 0.2·α(3m).
    pub rs_score: f64,
    pub alpha_1w: f64,
    pub alpha_1m: f64,
    pub alpha_3m: f64,
    /// Large-cap confirmation + week-over-week volume surge held.
    pub trickle_down_ready: bool,
    /// Members that passed the trading-value / MA60 filter, in member order.
    pub tickers: Vec<String>,
    /// Small/mid-cap movers flagged by the trickle-down rule. Always a
    /// subset of `tickers`.
    pub priority_tickers: Vec<String>,
}
