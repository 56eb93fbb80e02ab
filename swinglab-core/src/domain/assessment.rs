//! Deep-dive assessment outputs and the fused composite score.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body range of the last bearish candle preceding an impulse move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    /// Body top (the bearish candle's open).
    pub top: f64,
    /// Body bottom (the bearish candle's close).
    pub bottom: f64,
    pub date: NaiveDate,
    /// Close-to-close change of the impulse session, percent.
    pub impulse_pct: f64,
    /// Impulse session volume over its 20-day average.
    pub volume_ratio: f64,
}

/// One volatility-contraction phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contraction {
    /// High-to-low pullback depth, percent of the phase high.
    pub depth_pct: f64,
    /// Phase average volume over the 20-day average at the phase high.
    pub volume_ratio: f64,
}

/// Volatility contraction pattern state.
///
/// When `detected`, `contractions` holds exactly the three final phases in
/// order, strictly decreasing in depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcpPattern {
    pub detected: bool,
    pub contractions: Vec<Contraction>,
    /// High of the final (tightest) contraction — the breakout trigger.
    pub pivot: f64,
    /// Depth of the final contraction, percent.
    pub tightness_pct: f64,
}

impl VcpPattern {
    pub fn none() -> Self {
        Self {
            detected: false,
            contractions: Vec::new(),
            pivot: 0.0,
            tightness_pct: 0.0,
        }
    }
}

/// Technical deep-dive output for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAssessment {
    pub ticker: String,
    /// 0–100. Zero when none of the three patterns is present.
    pub score: f64,
    /// Most recent bullish order block, if any.
    pub order_block: Option<OrderBlock>,
    pub vcp: VcpPattern,
    /// Volume-profile point of control over the trailing window.
    pub poc: f64,
    pub price_above_poc: bool,
    pub current_price: f64,
    /// Next overhead resistance (trailing-window high).
    pub resistance: f64,
    /// Support level (latest order-block bottom, else trailing-window low).
    pub support: f64,
}

/// Binary fundamental verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundamentalVerdict {
    Pass,
    Fail,
}

/// Fundamental deep-dive output for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalAssessment {
    pub ticker: String,
    /// Piotroski F-score. `None` when any of the nine inputs is missing.
    pub f_score: Option<u8>,
    /// Stock P/E over sector average P/E.
    pub relative_per: Option<f64>,
    pub peg: Option<f64>,
    pub verdict: FundamentalVerdict,
    /// Populated when `verdict` is FAIL.
    pub fail_reason: Option<String>,
    /// Soft findings: CB overhang, unavailable disclosure feed.
    pub warnings: Vec<String>,
}

impl FundamentalAssessment {
    pub fn passed(&self) -> bool {
        self.verdict == FundamentalVerdict::Pass
    }
}

/// Flow conviction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowLevel {
    High,
    Medium,
    Low,
}

impl FlowLevel {
    /// Composite contribution: HIGH 100, MEDIUM 50, LOW never ranks.
    pub fn composite_points(&self) -> f64 {
        match self {
            FlowLevel::High => 100.0,
            FlowLevel::Medium => 50.0,
            FlowLevel::Low => 0.0,
        }
    }
}

/// Flow deep-dive output for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowAssessment {
    pub ticker: String,
    /// Cumulative non-arbitrage program net-buy slope is positive.
    pub program_slope_positive: bool,
    /// Foreign/institutional buy volume over retail buy volume, when the
    /// broker window had any classified retail volume.
    pub smart_buy_ratio: Option<f64>,
    pub broker_dominance: bool,
    /// Sessions with positive foreign or institutional net flow within the
    /// accumulation window.
    pub accumulation_days: u32,
    pub accumulation_positive: bool,
    pub level: FlowLevel,
    /// Net foreign / institutional flow over the accumulation window, for
    /// the report.
    pub net_foreign: f64,
    pub net_institution: f64,
}

/// Fused per-candidate score, or the reason the candidate was discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub ticker: String,
    pub technical_score: f64,
    pub fundamental_verdict: FundamentalVerdict,
    pub flow_level: FlowLevel,
    /// 0.5·technical + 0.3·flow + 0.2·fundamental. Zero for hard-filtered
    /// candidates.
    pub composite: f64,
    /// 1-based rank among retained candidates.
    pub rank: Option<u32>,
    pub discard_reason: Option<String>,
}

impl CompositeScore {
    pub fn is_selected(&self) -> bool {
        self.rank.is_some() && self.discard_reason.is_none()
    }
}
