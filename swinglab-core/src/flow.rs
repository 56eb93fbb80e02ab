//! Flow deep-dive evaluator — who is accumulating the stock.
//!
//! Three independent signals: the slope of the cumulative non-arbitrage
//! program net-buy curve, foreign/institutional dominance over retail in
//! the broker window, and the count of accumulation sessions. The level is
//! HIGH only when all three fire, MEDIUM on exactly two.

use crate::config::FlowThresholds;
use crate::domain::{BrokerVolume, FlowAssessment, FlowDay, FlowLevel};
use crate::error::EvaluatorError;
use crate::indicators::lsq_slope;

pub struct FlowEvaluator<'a> {
    thresholds: &'a FlowThresholds,
}

impl<'a> FlowEvaluator<'a> {
    pub fn new(thresholds: &'a FlowThresholds) -> Self {
        Self { thresholds }
    }

    pub fn assess(
        &self,
        ticker: &str,
        flows: &[FlowDay],
        broker_window: &[BrokerVolume],
    ) -> Result<FlowAssessment, EvaluatorError> {
        if flows.is_empty() {
            return Err(EvaluatorError::EmptyFlowSeries {
                ticker: ticker.to_string(),
            });
        }
        let t = self.thresholds;

        let program_slope_positive = self.program_slope_positive(flows);
        let (broker_dominance, smart_buy_ratio) = self.broker_dominance(broker_window);
        let accumulation_days = self.accumulation_days(flows);
        let accumulation_positive = accumulation_days >= t.accumulation_min_days;

        let signals = [program_slope_positive, broker_dominance, accumulation_positive]
            .iter()
            .filter(|&&s| s)
            .count();
        let level = match signals {
            3 => FlowLevel::High,
            2 => FlowLevel::Medium,
            _ => FlowLevel::Low,
        };

        let window = &flows[flows.len().saturating_sub(t.accumulation_window)..];
        let net_foreign = window.iter().map(|d| d.foreign_net).sum();
        let net_institution = window.iter().map(|d| d.institution_net).sum();

        Ok(FlowAssessment {
            ticker: ticker.to_string(),
            program_slope_positive,
            smart_buy_ratio,
            broker_dominance,
            accumulation_days,
            accumulation_positive,
            level,
            net_foreign,
            net_institution,
        })
    }

    /// Least-squares slope of the cumulative program net-buy curve over the
    /// trailing slope window.
    fn program_slope_positive(&self, flows: &[FlowDay]) -> bool {
        let mut cumulative = Vec::with_capacity(flows.len());
        let mut acc = 0.0;
        for day in flows {
            acc += day.program_non_arb_net;
            cumulative.push(acc);
        }
        let tail = &cumulative[cumulative.len().saturating_sub(self.thresholds.slope_window)..];
        matches!(lsq_slope(tail), Some(slope) if slope > 0.0)
    }

    /// Classified foreign/institutional buy volume against retail.
    ///
    /// Unclassified brokers are ignored. With no retail volume at all,
    /// any classified smart volume counts as dominance.
    fn broker_dominance(&self, window: &[BrokerVolume]) -> (bool, Option<f64>) {
        let t = self.thresholds;
        let mut smart = 0.0;
        let mut retail = 0.0;
        for entry in window {
            if t.smart_brokers.iter().any(|b| b == &entry.broker) {
                smart += entry.buy_volume;
            } else if t.retail_brokers.iter().any(|b| b == &entry.broker) {
                retail += entry.buy_volume;
            }
        }
        if retail == 0.0 {
            return (smart > 0.0, None);
        }
        let ratio = smart / retail;
        (ratio > t.dominance_ratio, Some(ratio))
    }

    /// Sessions in the trailing window with positive foreign or
    /// institutional net flow.
    fn accumulation_days(&self, flows: &[FlowDay]) -> u32 {
        let window = &flows[flows.len().saturating_sub(self.thresholds.accumulation_window)..];
        window
            .iter()
            .filter(|d| d.foreign_net > 0.0 || d.institution_net > 0.0)
            .count() as u32
    }
}
