//! Risk planner — converts a ranked candidate into a concrete trade setup.
//!
//! Entry anchors on the strongest available trigger (VCP pivot, then
//! order-block top, then current price). The stop is entry − 3×ATR(14),
//! the target is the next identified resistance, and the plan is REJECTED
//! whenever reward/risk comes in under the floor — regardless of how well
//! the candidate scored upstream. Pyramiding is fixed at 30/30/40 with
//! ascending profit triggers; pyramided stops only trail up.

pub mod ratchet;

pub use ratchet::StopRatchet;

use crate::config::RiskThresholds;
use crate::domain::{
    EntryZone, FlowAssessment, FlowLevel, FundamentalAssessment, PlanVerdict, PyramidTier,
    TechnicalAssessment, TradePlan,
};

pub struct RiskPlanner<'a> {
    thresholds: &'a RiskThresholds,
}

impl<'a> RiskPlanner<'a> {
    pub fn new(thresholds: &'a RiskThresholds) -> Self {
        Self { thresholds }
    }

    pub fn plan(
        &self,
        technical: &TechnicalAssessment,
        fundamental: &FundamentalAssessment,
        flow: &FlowAssessment,
        atr_14: f64,
        account_balance: f64,
    ) -> TradePlan {
        let t = self.thresholds;
        let ticker = technical.ticker.clone();
        let buy_reason = build_buy_reason(technical, fundamental, flow);

        let entry_ref = entry_reference(technical);
        let entry = EntryZone {
            low: entry_ref,
            high: entry_ref * (1.0 + t.entry_zone_width),
        };

        if !atr_14.is_finite() || atr_14 <= 0.0 || entry_ref <= 0.0 {
            return TradePlan {
                ticker,
                buy_reason,
                entry,
                atr_14: f64::NAN,
                stop: 0.0,
                target: technical.resistance,
                reward_risk: 0.0,
                tiers: Vec::new(),
                initial_shares: 0,
                verdict: PlanVerdict::Reject,
                verdict_reason: "ATR(14) unavailable".to_string(),
            };
        }

        let stop = self.initial_stop(entry_ref, atr_14);
        let risk_per_share = entry_ref - stop;
        let target = technical.resistance;
        let reward = target - entry_ref;
        let reward_risk = if risk_per_share > 0.0 && reward > 0.0 {
            reward / risk_per_share
        } else {
            0.0
        };

        let tiers = self.size_tiers(account_balance, risk_per_share);
        let initial_shares = tiers.first().map(|t| t.shares).unwrap_or(0);

        let (verdict, verdict_reason) = if reward_risk < t.min_reward_risk {
            (
                PlanVerdict::Reject,
                format!(
                    "R/R {reward_risk:.2} below threshold {:.1}",
                    t.min_reward_risk
                ),
            )
        } else if !fundamental.passed() {
            (PlanVerdict::Reject, "fundamental verdict FAIL".to_string())
        } else if flow.level == FlowLevel::Low {
            (PlanVerdict::Reject, "flow level LOW".to_string())
        } else {
            (
                PlanVerdict::Accept,
                format!("R/R {reward_risk:.2} with all gates clear"),
            )
        };

        TradePlan {
            ticker,
            buy_reason,
            entry,
            atr_14,
            stop,
            target,
            reward_risk,
            tiers,
            initial_shares,
            verdict,
            verdict_reason,
        }
    }

    /// Entry − multiplier×ATR, floored at the maximum stop percentage so a
    /// huge ATR cannot push the stop to zero or below.
    fn initial_stop(&self, entry: f64, atr_14: f64) -> f64 {
        let t = self.thresholds;
        let stop = entry - t.atr_stop_multiplier * atr_14;
        if stop <= 0.0 {
            entry * (1.0 - t.max_stop_pct)
        } else {
            stop
        }
    }

    /// Split the risk-budgeted share count across the pyramiding tiers.
    /// The last tier absorbs the rounding remainder so the fractions keep
    /// summing to one in shares.
    fn size_tiers(&self, account_balance: f64, risk_per_share: f64) -> Vec<PyramidTier> {
        let t = self.thresholds;
        let total_shares = if risk_per_share > 0.0 {
            (account_balance * t.risk_per_trade / risk_per_share).floor() as u64
        } else {
            0
        };

        let mut tiers: Vec<PyramidTier> = t
            .pyramid_tiers
            .iter()
            .map(|&[fraction, trigger]| PyramidTier {
                fraction,
                trigger_profit: trigger,
                shares: (total_shares as f64 * fraction).floor() as u64,
            })
            .collect();
        if let Some(last) = tiers.last_mut() {
            let allocated: u64 = t.pyramid_tiers[..t.pyramid_tiers.len() - 1]
                .iter()
                .map(|&[fraction, _]| (total_shares as f64 * fraction).floor() as u64)
                .sum();
            last.shares = total_shares - allocated;
        }
        tiers
    }
}

/// Strongest available entry trigger.
fn entry_reference(technical: &TechnicalAssessment) -> f64 {
    if technical.vcp.detected && technical.vcp.pivot > 0.0 {
        technical.vcp.pivot
    } else if let Some(ob) = &technical.order_block {
        ob.top
    } else {
        technical.current_price
    }
}

fn build_buy_reason(
    technical: &TechnicalAssessment,
    fundamental: &FundamentalAssessment,
    flow: &FlowAssessment,
) -> String {
    let mut parts = Vec::new();
    if technical.vcp.detected {
        parts.push(format!(
            "VCP pivot {:.0} (tightness {:.1}%)",
            technical.vcp.pivot, technical.vcp.tightness_pct
        ));
    }
    if let Some(ob) = &technical.order_block {
        parts.push(format!("order-block support {:.0}", ob.bottom));
    }
    if technical.price_above_poc {
        parts.push("above POC".to_string());
    }
    if let Some(score) = fundamental.f_score {
        parts.push(format!("F-score {score}/9"));
    }
    if flow.accumulation_positive {
        parts.push(format!("{}d accumulation", flow.accumulation_days));
    }
    if parts.is_empty() {
        "no supporting evidence".to_string()
    } else {
        parts.join(" | ")
    }
}

/// Stop management across pyramided entries.
///
/// Every added entry recomputes the stop from the blended average entry
/// price and the latest ATR, then runs it through the ratchet: the stop
/// never drops below its previous level.
#[derive(Debug, Clone)]
pub struct PyramidPosition {
    atr_multiplier: f64,
    total_shares: u64,
    total_cost: f64,
    ratchet: StopRatchet,
    stop: f64,
}

impl PyramidPosition {
    /// Open with the first fill.
    pub fn open(thresholds: &RiskThresholds, price: f64, shares: u64, atr: f64) -> Self {
        let mut ratchet = StopRatchet::new();
        let stop = ratchet.apply(price - thresholds.atr_stop_multiplier * atr);
        Self {
            atr_multiplier: thresholds.atr_stop_multiplier,
            total_shares: shares,
            total_cost: price * shares as f64,
            ratchet,
            stop,
        }
    }

    /// Record an additional fill and recompute the stop from the new
    /// blended average entry. Returns the effective stop.
    pub fn add_entry(&mut self, price: f64, shares: u64, atr: f64) -> f64 {
        self.total_shares += shares;
        self.total_cost += price * shares as f64;
        let proposed = self.average_entry() - self.atr_multiplier * atr;
        self.stop = self.ratchet.apply(proposed);
        self.stop
    }

    pub fn average_entry(&self) -> f64 {
        if self.total_shares == 0 {
            0.0
        } else {
            self.total_cost / self.total_shares as f64
        }
    }

    pub fn stop(&self) -> f64 {
        self.stop
    }

    pub fn total_shares(&self) -> u64 {
        self.total_shares
    }
}
