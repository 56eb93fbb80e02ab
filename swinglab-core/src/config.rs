//! Typed threshold tables for every pipeline component.
//!
//! The trading rules live here as explicit, versioned configuration rather
//! than prose documents: each evaluator receives its table by reference and
//! contains no hard-coded thresholds. Defaults carry the rulebook values;
//! `validate` rejects tables that would break a pipeline invariant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bumped when a table gains or loses fields in a breaking way.
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("pyramid fractions must sum to 1.0 (got {0})")]
    PyramidFractionSum(f64),
    #[error("pyramid profit triggers must be strictly ascending")]
    PyramidTriggerOrder,
    #[error("composite weights must sum to 1.0 (got {0})")]
    CompositeWeightSum(f64),
    #[error("sector RS weights must sum to 1.0 (got {0})")]
    SectorWeightSum(f64),
    #[error("contraction bands must be decreasing, each with low <= high")]
    ContractionBands,
    #[error("{0} must be positive")]
    NonPositive(&'static str),
}

/// Regime gate thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeThresholds {
    /// Breadth below this is oversold (contrarian full size).
    pub oversold_breadth: f64,
    /// Breadth above this is overbought (no new entries).
    pub overbought_breadth: f64,
    /// Volatility hard stop fires when vol > prior × this and the index is
    /// under its 20-day average.
    pub vol_spike_ratio: f64,
    /// FX/index correlation above this halves the bet size.
    pub decoupling_corr: f64,
    pub decoupling_multiplier: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            oversold_breadth: 75.0,
            overbought_breadth: 120.0,
            vol_spike_ratio: 1.05,
            decoupling_corr: 0.2,
            decoupling_multiplier: 0.5,
        }
    }
}

/// Sector screen thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorThresholds {
    pub top_sectors: usize,
    pub weight_1w: f64,
    pub weight_1m: f64,
    pub weight_3m: f64,
    /// Sessions per return window.
    pub sessions_1w: usize,
    pub sessions_1m: usize,
    pub sessions_3m: usize,
    /// Minimum session traded value for the primary filter.
    pub min_trading_value: f64,
    /// Moving-average window for the primary price filter.
    pub ma_filter_window: usize,
    /// Close must exceed the filter MA × this slack factor.
    pub ma60_slack: f64,
    /// Week-over-week sector volume ratio for the trickle-down rule.
    pub volume_surge_ratio: f64,
    /// How many top-by-cap members must confirm above their 20-day MA.
    pub large_cap_count: usize,
    /// Daily change (percent) that counts as a fresh upward impulse.
    pub impulse_min_pct: f64,
    /// Impulse volume over 20-day average volume.
    pub impulse_volume_ratio: f64,
}

impl Default for SectorThresholds {
    fn default() -> Self {
        Self {
            top_sectors: 3,
            weight_1w: 0.5,
            weight_1m: 0.3,
            weight_3m: 0.2,
            sessions_1w: 5,
            sessions_1m: 20,
            sessions_3m: 60,
            min_trading_value: 1.0e10,
            ma_filter_window: 60,
            ma60_slack: 0.95,
            volume_surge_ratio: 1.2,
            large_cap_count: 3,
            impulse_min_pct: 2.0,
            impulse_volume_ratio: 1.5,
        }
    }
}

/// Technical evaluator thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalThresholds {
    /// Close-to-close change (percent) qualifying an impulse session.
    pub impulse_min_change_pct: f64,
    /// Impulse volume over 20-day average volume.
    pub impulse_volume_ratio: f64,
    /// Prior bars whose swing high the impulse must break.
    pub swing_lookback: usize,
    /// Bars scanned for order blocks.
    pub order_block_scan: usize,
    /// The last bearish candle must sit within this many bars before the
    /// impulse.
    pub last_bearish_within: usize,
    /// Bars scanned for the contraction pattern.
    pub vcp_window: usize,
    /// Half-width of the local-extreme pivot window.
    pub pivot_window: usize,
    /// Depth bands (percent, [low, high]) for the three phases, widest
    /// first.
    pub contraction_bands: [[f64; 2]; 3],
    /// Both band edges are widened by this fraction before checking.
    pub band_slack: f64,
    /// Volume-profile lookback and bin count.
    pub poc_window: usize,
    pub poc_bins: usize,
    /// Final contraction tighter than this earns the tightness bonus.
    pub tight_bonus_pct: f64,
}

impl Default for TechnicalThresholds {
    fn default() -> Self {
        Self {
            impulse_min_change_pct: 4.0,
            impulse_volume_ratio: 2.0,
            swing_lookback: 20,
            order_block_scan: 60,
            last_bearish_within: 5,
            vcp_window: 120,
            pivot_window: 7,
            contraction_bands: [[15.0, 20.0], [8.0, 10.0], [3.0, 5.0]],
            band_slack: 0.25,
            poc_window: 60,
            poc_bins: 50,
            tight_bonus_pct: 5.0,
        }
    }
}

/// Fundamental evaluator thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalThresholds {
    pub pass_f_score: u8,
    pub hard_fail_f_score: u8,
    pub max_relative_per: f64,
    pub max_peg: f64,
    /// Trailing window for blacklist disclosures, days.
    pub blacklist_window_days: i64,
    /// CB overhang (percent of market cap) that raises a warning.
    pub cb_overhang_warn_pct: f64,
}

impl Default for FundamentalThresholds {
    fn default() -> Self {
        Self {
            pass_f_score: 7,
            hard_fail_f_score: 4,
            max_relative_per: 0.8,
            max_peg: 1.5,
            blacklist_window_days: 180,
            cb_overhang_warn_pct: 5.0,
        }
    }
}

/// Flow evaluator thresholds, including the fixed broker classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowThresholds {
    /// Sessions of the cumulative program series the slope is fit over.
    pub slope_window: usize,
    /// Foreign/institutional buy volume must exceed retail × this.
    pub dominance_ratio: f64,
    /// Trailing sessions for the accumulation count.
    pub accumulation_window: usize,
    pub accumulation_min_days: u32,
    /// Brokers classified as foreign/institutional.
    pub smart_brokers: Vec<String>,
    /// Brokers classified as retail-dominant.
    pub retail_brokers: Vec<String>,
}

impl Default for FlowThresholds {
    fn default() -> Self {
        Self {
            slope_window: 10,
            dominance_ratio: 2.0,
            accumulation_window: 5,
            accumulation_min_days: 3,
            smart_brokers: [
                "Morgan Stanley",
                "JP Morgan",
                "Goldman Sachs",
                "Merrill Lynch",
                "UBS",
                "CLSA",
                "Macquarie",
            ]
            .map(String::from)
            .to_vec(),
            retail_brokers: ["Kiwoom", "Mirae Asset", "KB", "NH", "Toss"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// Aggregation and ranking thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerThresholds {
    pub min_technical_score: f64,
    pub weight_technical: f64,
    pub weight_flow: f64,
    pub weight_fundamental: f64,
    pub top_candidates: usize,
}

impl Default for RankerThresholds {
    fn default() -> Self {
        Self {
            min_technical_score: 70.0,
            weight_technical: 0.5,
            weight_flow: 0.3,
            weight_fundamental: 0.2,
            top_candidates: 3,
        }
    }
}

/// Risk planner thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub atr_period: usize,
    pub atr_stop_multiplier: f64,
    pub min_reward_risk: f64,
    /// Stop fallback when the ATR formula goes non-positive: entry × (1 −
    /// this).
    pub max_stop_pct: f64,
    /// Fraction of the account risked per trade.
    pub risk_per_trade: f64,
    /// Entry zone width as a fraction of the entry reference.
    pub entry_zone_width: f64,
    /// Pyramiding tiers as [allocation fraction, profit trigger fraction].
    pub pyramid_tiers: [[f64; 2]; 3],
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            atr_period: 14,
            atr_stop_multiplier: 3.0,
            min_reward_risk: 2.0,
            max_stop_pct: 0.07,
            risk_per_trade: 0.02,
            entry_zone_width: 0.01,
            pyramid_tiers: [[0.30, 0.0], [0.30, 0.03], [0.40, 0.05]],
        }
    }
}

/// All evaluator tables under one root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub version: u32,
    pub regime: RegimeThresholds,
    pub sector: SectorThresholds,
    pub technical: TechnicalThresholds,
    pub fundamental: FundamentalThresholds,
    pub flow: FlowThresholds,
    pub ranker: RankerThresholds,
    pub risk: RiskThresholds,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            regime: RegimeThresholds::default(),
            sector: SectorThresholds::default(),
            technical: TechnicalThresholds::default(),
            fundamental: FundamentalThresholds::default(),
            flow: FlowThresholds::default(),
            ranker: RankerThresholds::default(),
            risk: RiskThresholds::default(),
        }
    }
}

impl EvaluationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let eps = 1e-9;

        let frac_sum: f64 = self.risk.pyramid_tiers.iter().map(|t| t[0]).sum();
        if (frac_sum - 1.0).abs() > eps {
            return Err(ConfigError::PyramidFractionSum(frac_sum));
        }
        let ascending = self
            .risk
            .pyramid_tiers
            .windows(2)
            .all(|w| w[0][1] < w[1][1]);
        if !ascending {
            return Err(ConfigError::PyramidTriggerOrder);
        }

        let weight_sum =
            self.ranker.weight_technical + self.ranker.weight_flow + self.ranker.weight_fundamental;
        if (weight_sum - 1.0).abs() > eps {
            return Err(ConfigError::CompositeWeightSum(weight_sum));
        }

        let rs_sum = self.sector.weight_1w + self.sector.weight_1m + self.sector.weight_3m;
        if (rs_sum - 1.0).abs() > eps {
            return Err(ConfigError::SectorWeightSum(rs_sum));
        }

        let bands = &self.technical.contraction_bands;
        let bands_ok = bands.iter().all(|b| b[0] <= b[1])
            && bands.windows(2).all(|w| w[0][0] > w[1][0] && w[0][1] > w[1][1]);
        if !bands_ok {
            return Err(ConfigError::ContractionBands);
        }

        if self.ranker.top_candidates == 0 {
            return Err(ConfigError::NonPositive("ranker.top_candidates"));
        }
        if self.sector.top_sectors == 0 {
            return Err(ConfigError::NonPositive("sector.top_sectors"));
        }
        if self.risk.atr_period == 0 {
            return Err(ConfigError::NonPositive("risk.atr_period"));
        }
        if self.risk.min_reward_risk <= 0.0 {
            return Err(ConfigError::NonPositive("risk.min_reward_risk"));
        }
        if self.risk.risk_per_trade <= 0.0 {
            return Err(ConfigError::NonPositive("risk.risk_per_trade"));
        }

        Ok(())
    }
}
