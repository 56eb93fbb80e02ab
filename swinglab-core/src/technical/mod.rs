//! Technical deep-dive evaluator.
//!
//! Three independent pattern signals — order block, volatility contraction,
//! volume-profile POC — fused into a 0–100 score. The score is monotonic in
//! each signal and zero when no pattern is present at all. Price below the
//! POC is a penalty (overhead supply), not an automatic fail.

pub mod order_block;
pub mod vcp;
pub mod volume_profile;

use crate::config::TechnicalThresholds;
use crate::domain::{Bar, OrderBlock, TechnicalAssessment, VcpPattern};
use crate::error::EvaluatorError;

pub struct TechnicalEvaluator<'a> {
    thresholds: &'a TechnicalThresholds,
}

impl<'a> TechnicalEvaluator<'a> {
    pub fn new(thresholds: &'a TechnicalThresholds) -> Self {
        Self { thresholds }
    }

    /// Sessions of history the evaluator needs before it can assess.
    pub fn required_history(&self) -> usize {
        self.thresholds.poc_window
    }

    pub fn assess(&self, ticker: &str, bars: &[Bar]) -> Result<TechnicalAssessment, EvaluatorError> {
        let t = self.thresholds;
        if bars.len() < self.required_history() {
            return Err(EvaluatorError::InsufficientHistory {
                ticker: ticker.to_string(),
                have: bars.len(),
                need: self.required_history(),
            });
        }
        if let Some(index) = bars.iter().position(|b| !b.is_sane()) {
            return Err(EvaluatorError::MalformedBar {
                ticker: ticker.to_string(),
                index,
            });
        }

        let blocks = order_block::detect(bars, t);
        let latest_block = blocks.last().cloned();
        let vcp = vcp::detect(bars, t);

        let current_price = bars.last().map(|b| b.close).unwrap_or(f64::NAN);
        let poc = volume_profile::poc(bars, t.poc_window, t.poc_bins).unwrap_or(current_price);
        let price_above_poc = current_price > poc;

        let tail = &bars[bars.len() - t.poc_window..];
        let resistance = tail.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let support = latest_block
            .as_ref()
            .map(|ob| ob.bottom)
            .unwrap_or_else(|| tail.iter().map(|b| b.low).fold(f64::INFINITY, f64::min));

        let score = self.score(&vcp, latest_block.as_ref(), price_above_poc, current_price);

        Ok(TechnicalAssessment {
            ticker: ticker.to_string(),
            score,
            order_block: latest_block,
            vcp,
            poc,
            price_above_poc,
            current_price,
            resistance,
            support,
        })
    }

    /// Weighting: VCP 40 (+5 tightness bonus), order block 35 when support
    /// holds (10 when price has lost the block), POC +25 above / −15 below.
    fn score(
        &self,
        vcp: &VcpPattern,
        block: Option<&OrderBlock>,
        price_above_poc: bool,
        current_price: f64,
    ) -> f64 {
        let mut score: f64 = 0.0;

        if vcp.detected {
            score += 40.0;
            if vcp.tightness_pct < self.thresholds.tight_bonus_pct {
                score += 5.0;
            }
        }

        if let Some(ob) = block {
            score += if current_price >= ob.bottom { 35.0 } else { 10.0 };
        }

        if price_above_poc {
            score += 25.0;
        } else {
            score -= 15.0;
        }

        score.clamp(0.0, 100.0)
    }
}
