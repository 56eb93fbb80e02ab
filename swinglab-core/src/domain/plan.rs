//! Trade plan emitted by the risk planner.

use serde::{Deserialize, Serialize};

/// Entry price band. `low` is the planned reference entry (VCP pivot,
/// order-block retest, or current price); `high` bounds chasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryZone {
    pub low: f64,
    pub high: f64,
}

impl EntryZone {
    /// The price all stop/target math anchors on.
    pub fn reference(&self) -> f64 {
        self.low
    }
}

/// One pyramiding tier: allocation fraction, unrealized-profit trigger,
/// and the share count it maps to for the sized account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidTier {
    pub fraction: f64,
    /// Unrealized profit (fraction of entry) that unlocks this tier.
    /// The initial tier triggers at 0.0.
    pub trigger_profit: f64,
    pub shares: u64,
}

/// Final gate outcome for a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanVerdict {
    Accept,
    Reject,
}

/// Concrete, formula-driven trade setup for one ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub ticker: String,
    /// Compact summary of the evidence behind the setup.
    pub buy_reason: String,
    pub entry: EntryZone,
    pub atr_14: f64,
    /// Initial stop: entry − multiplier×ATR, floored at the maximum stop
    /// percentage. Always strictly below the entry reference.
    pub stop: f64,
    /// Target: next identified resistance.
    pub target: f64,
    pub reward_risk: f64,
    pub tiers: Vec<PyramidTier>,
    /// Shares for the first tier.
    pub initial_shares: u64,
    pub verdict: PlanVerdict,
    pub verdict_reason: String,
}

impl TradePlan {
    pub fn is_accepted(&self) -> bool {
        self.verdict == PlanVerdict::Accept
    }
}
