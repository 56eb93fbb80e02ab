//! Aggregation and ranking of the deep-dive results.
//!
//! Hard filters run before any scoring: fundamental FAIL, technical score
//! under the floor, or LOW flow discard a candidate with a recorded reason.
//! Survivors are fused (0.5 technical, 0.3 flow, 0.2 fundamental), sorted
//! descending with a lexical ticker tie-break, and the top 3 are selected.
//! Nothing is silently dropped: every input reappears in the output, either
//! ranked or with its discard reason.

use crate::config::RankerThresholds;
use crate::domain::{
    CompositeScore, FlowAssessment, FlowLevel, FundamentalAssessment, TechnicalAssessment,
};

/// The three evaluator outputs for one candidate, keyed by ticker.
#[derive(Debug, Clone)]
pub struct CandidateAssessments {
    pub technical: TechnicalAssessment,
    pub fundamental: FundamentalAssessment,
    pub flow: FlowAssessment,
}

impl CandidateAssessments {
    pub fn ticker(&self) -> &str {
        &self.technical.ticker
    }
}

pub struct Ranker<'a> {
    thresholds: &'a RankerThresholds,
}

impl<'a> Ranker<'a> {
    pub fn new(thresholds: &'a RankerThresholds) -> Self {
        Self { thresholds }
    }

    /// Fuse and rank. Selected candidates come first in composite order,
    /// then every discarded candidate in ticker order.
    pub fn rank(&self, candidates: &[CandidateAssessments]) -> Vec<CompositeScore> {
        let t = self.thresholds;
        let mut survivors: Vec<CompositeScore> = Vec::new();
        let mut discarded: Vec<CompositeScore> = Vec::new();

        for c in candidates {
            let discard_reason = if !c.fundamental.passed() {
                Some(match &c.fundamental.fail_reason {
                    Some(reason) => format!("fundamental FAIL: {reason}"),
                    None => "fundamental FAIL".to_string(),
                })
            } else if c.technical.score < t.min_technical_score {
                Some(format!(
                    "technical score {:.0} below {:.0}",
                    c.technical.score, t.min_technical_score
                ))
            } else if c.flow.level == FlowLevel::Low {
                Some("flow level LOW".to_string())
            } else {
                None
            };

            let entry = CompositeScore {
                ticker: c.ticker().to_string(),
                technical_score: c.technical.score,
                fundamental_verdict: c.fundamental.verdict,
                flow_level: c.flow.level,
                composite: 0.0,
                rank: None,
                discard_reason,
            };

            if entry.discard_reason.is_some() {
                discarded.push(entry);
            } else {
                let composite = t.weight_technical * c.technical.score
                    + t.weight_flow * c.flow.level.composite_points()
                    + t.weight_fundamental * 100.0;
                survivors.push(CompositeScore { composite, ..entry });
            }
        }

        survivors.sort_by(|a, b| {
            b.composite
                .total_cmp(&a.composite)
                .then_with(|| a.ticker.cmp(&b.ticker))
        });
        for (i, s) in survivors.iter_mut().enumerate() {
            if i < t.top_candidates {
                s.rank = Some(i as u32 + 1);
            } else {
                s.discard_reason = Some(format!("ranked below top {} cutoff", t.top_candidates));
            }
        }

        discarded.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        survivors.extend(discarded);
        survivors
    }
}
