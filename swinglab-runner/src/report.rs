//! Report assembly and rendering.
//!
//! The report is the pipeline's only output: regime decision, retained
//! sectors, the full ranking (selected and discarded, each with reasons),
//! recorded exclusions, and the trade plans. It serializes to canonical
//! JSON — identical inputs give byte-identical output — and renders to
//! markdown for humans plus a CSV of plans for spreadsheets.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use swinglab_core::domain::{
    CompositeScore, PlanVerdict, RegimeDecision, SectorCandidate, TradePlan,
};

use crate::pipeline::PipelineRequest;

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// A candidate that never made it to ranking, with the reason why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub ticker: String,
    pub reason: String,
}

/// Complete result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub schema_version: u32,
    pub run_id: String,
    pub as_of: NaiveDate,
    pub account_balance: f64,
    pub force_analysis: bool,
    /// True when the regime gate terminated the run before phase 2.
    pub halted: bool,
    /// None only under force_analysis.
    pub regime: Option<RegimeDecision>,
    pub sectors: Vec<SectorCandidate>,
    pub exclusions: Vec<Exclusion>,
    pub scores: Vec<CompositeScore>,
    pub plans: Vec<TradePlan>,
    /// Pre-scored sentiment passthrough, ticker → impact in [-1, 1].
    pub sentiment: BTreeMap<String, f64>,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Report {
    /// Report for a run the regime gate terminated.
    pub fn halted(run_id: String, request: &PipelineRequest, decision: RegimeDecision) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            run_id,
            as_of: request.as_of,
            account_balance: request.account_balance,
            force_analysis: request.force_analysis,
            halted: true,
            regime: Some(decision),
            sectors: Vec::new(),
            exclusions: Vec::new(),
            scores: Vec::new(),
            plans: Vec::new(),
            sentiment: BTreeMap::new(),
        }
    }

    pub fn accepted_plans(&self) -> impl Iterator<Item = &TradePlan> {
        self.plans.iter().filter(|p| p.is_accepted())
    }

    /// Canonical JSON. Field order is fixed by the struct, map order by
    /// BTreeMap, so identical runs serialize byte-identically.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "# SwingLab Report — {}\n", self.as_of);
        let _ = writeln!(md, "Run ID: `{}`\n", self.run_id);

        let _ = writeln!(md, "## Market Regime");
        match &self.regime {
            Some(decision) => {
                let _ = writeln!(md, "- Status: **{:?}**", decision.regime);
                let _ = writeln!(md, "- Breadth (20d): {:.1}", decision.breadth_ratio);
                let _ = writeln!(md, "- Vol index: {:.1}", decision.vol_index);
                let _ = writeln!(
                    md,
                    "- Bet size: {:.0}%",
                    decision.bet_multiplier * 100.0
                );
                let _ = writeln!(md, "- Reason: {}", decision.reason);
            }
            None => {
                let _ = writeln!(md, "- Bypassed (force_analysis)");
            }
        }
        if self.halted {
            let _ = writeln!(md, "\n**Hard stop — no further phases were run.**");
            return md;
        }

        if !self.sectors.is_empty() {
            let _ = writeln!(md, "\n## Leading Sectors");
            for sector in &self.sectors {
                let trickle = if sector.trickle_down_ready {
                    " — trickle-down ready"
                } else {
                    ""
                };
                let _ = writeln!(
                    md,
                    "- **{}** (RS {:.4}, 1m alpha {:+.4}){}",
                    sector.name, sector.rs_score, sector.alpha_1m, trickle
                );
            }
        }

        let _ = writeln!(md, "\n## Ranking");
        let selected: Vec<&CompositeScore> =
            self.scores.iter().filter(|s| s.is_selected()).collect();
        if selected.is_empty() {
            let _ = writeln!(md, "No candidate passed every filter.");
        } else {
            let _ = writeln!(md, "| Rank | Ticker | Composite | Tech | Fund | Flow |");
            let _ = writeln!(md, "|------|--------|-----------|------|------|------|");
            for score in &selected {
                let _ = writeln!(
                    md,
                    "| {} | {} | {:.1} | {:.0} | {:?} | {:?} |",
                    score.rank.unwrap_or(0),
                    score.ticker,
                    score.composite,
                    score.technical_score,
                    score.fundamental_verdict,
                    score.flow_level
                );
            }
        }

        let discarded: Vec<&CompositeScore> =
            self.scores.iter().filter(|s| !s.is_selected()).collect();
        if !discarded.is_empty() {
            let _ = writeln!(md, "\n### Discarded");
            for score in discarded {
                let _ = writeln!(
                    md,
                    "- {} — {}",
                    score.ticker,
                    score.discard_reason.as_deref().unwrap_or("unranked")
                );
            }
        }

        if !self.exclusions.is_empty() {
            let _ = writeln!(md, "\n### Excluded before ranking");
            for exclusion in &self.exclusions {
                let _ = writeln!(md, "- {} — {}", exclusion.ticker, exclusion.reason);
            }
        }

        let _ = writeln!(md, "\n## Trade Plans");
        if self.plans.is_empty() {
            let _ = writeln!(md, "None.");
        }
        for plan in &self.plans {
            let tag = match plan.verdict {
                PlanVerdict::Accept => "ACCEPT",
                PlanVerdict::Reject => "REJECT",
            };
            let _ = writeln!(md, "\n### {} — {}", plan.ticker, tag);
            let _ = writeln!(md, "- Reason: {}", plan.verdict_reason);
            let _ = writeln!(md, "- Evidence: {}", plan.buy_reason);
            let _ = writeln!(
                md,
                "- Entry zone: {:.0} – {:.0}",
                plan.entry.low, plan.entry.high
            );
            let _ = writeln!(
                md,
                "- Stop: {:.0} (ATR14 {:.1}) | Target: {:.0} | R/R: {:.2}",
                plan.stop, plan.atr_14, plan.target, plan.reward_risk
            );
            if let Some(sentiment) = self.sentiment.get(&plan.ticker) {
                let _ = writeln!(md, "- Sentiment impact: {sentiment:+.2}");
            }
            if !plan.tiers.is_empty() {
                let _ = writeln!(md, "\n| Tier | Allocation | Trigger | Shares |");
                let _ = writeln!(md, "|------|------------|---------|--------|");
                for (i, tier) in plan.tiers.iter().enumerate() {
                    let _ = writeln!(
                        md,
                        "| {} | {:.0}% | >{:.0}% | {} |",
                        i + 1,
                        tier.fraction * 100.0,
                        tier.trigger_profit * 100.0,
                        tier.shares
                    );
                }
            }
        }

        md
    }

    /// Write report.json, report.md, and plans.csv into `dir`.
    pub fn save_artifacts(&self, dir: &Path) -> Result<(), ExportError> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join("report.json"), self.to_json()?)?;
        std::fs::write(dir.join("report.md"), self.to_markdown())?;

        let mut writer = csv::Writer::from_path(dir.join("plans.csv"))?;
        writer.write_record([
            "ticker",
            "verdict",
            "entry_low",
            "entry_high",
            "stop",
            "target",
            "reward_risk",
            "atr_14",
            "initial_shares",
            "reason",
        ])?;
        for plan in &self.plans {
            writer.write_record([
                plan.ticker.clone(),
                format!("{:?}", plan.verdict),
                format!("{:.2}", plan.entry.low),
                format!("{:.2}", plan.entry.high),
                format!("{:.2}", plan.stop),
                format!("{:.2}", plan.target),
                format!("{:.4}", plan.reward_risk),
                format!("{:.4}", plan.atr_14),
                plan.initial_shares.to_string(),
                plan.verdict_reason.clone(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}
