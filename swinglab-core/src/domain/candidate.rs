//! Per-candidate data bundle — the immutable input to the deep-dive phase.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Bar;

/// One session of investor-flow data for a single ticker.
///
/// Net figures are signed volumes (buys minus sells) per investor class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDay {
    pub date: NaiveDate,
    pub foreign_net: f64,
    pub institution_net: f64,
    pub retail_net: f64,
    /// Non-arbitrage program net buy for the session.
    pub program_non_arb_net: f64,
}

/// Buy volume attributed to a named broker over the broker window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerVolume {
    pub broker: String,
    pub buy_volume: f64,
}

/// Latest financial-statement record with prior-year comparatives.
///
/// Every field is optional: providers surface what the filings contain and
/// the fundamental evaluator decides which absences are fatal. The nine
/// F-score tests need all fourteen statement fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub roa: Option<f64>,
    pub roa_prev: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub net_income: Option<f64>,
    pub long_term_debt_ratio: Option<f64>,
    pub long_term_debt_ratio_prev: Option<f64>,
    pub current_ratio: Option<f64>,
    pub current_ratio_prev: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub shares_outstanding_prev: Option<f64>,
    pub gross_margin: Option<f64>,
    pub gross_margin_prev: Option<f64>,
    pub asset_turnover: Option<f64>,
    pub asset_turnover_prev: Option<f64>,
    /// Trailing price/earnings ratio.
    pub per: Option<f64>,
    /// Price/earnings-to-growth ratio.
    pub peg: Option<f64>,
    /// Outstanding convertible bonds as a percentage of market cap.
    pub cb_overhang_pct: Option<f64>,
}

/// Disclosure categories that hard-fail a candidate when filed within the
/// trailing blacklist window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisclosureCategory {
    InsiderFraud,
    BreachOfDuty,
    GoingConcern,
    QualifiedAuditOpinion,
    DesignatedManagementIssue,
    UnfaithfulDisclosure,
}

impl DisclosureCategory {
    pub fn label(&self) -> &'static str {
        match self {
            DisclosureCategory::InsiderFraud => "insider fraud",
            DisclosureCategory::BreachOfDuty => "breach of duty",
            DisclosureCategory::GoingConcern => "going concern",
            DisclosureCategory::QualifiedAuditOpinion => "qualified audit opinion",
            DisclosureCategory::DesignatedManagementIssue => "designated management issue",
            DisclosureCategory::UnfaithfulDisclosure => "unfaithful disclosure",
        }
    }
}

/// A risk disclosure filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disclosure {
    pub category: DisclosureCategory,
    pub date: NaiveDate,
}

/// The already-resolved data bundle for one candidate.
///
/// Each concurrent evaluator receives a shared reference; nothing here is
/// mutated after the provider hands it over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateBundle {
    pub ticker: String,
    pub sector_code: Option<String>,
    /// Daily price/volume window, oldest first.
    pub bars: Vec<Bar>,
    /// Investor-flow window, oldest first.
    pub flows: Vec<FlowDay>,
    /// Broker-window buy volumes for the dominance check.
    pub broker_window: Vec<BrokerVolume>,
    pub financials: Option<FinancialRecord>,
    /// `None` means the disclosure feed was unavailable (degraded, warn);
    /// `Some(vec![])` means the feed was checked and came back clean.
    pub disclosures: Option<Vec<Disclosure>>,
    /// Sector average P/E for the relative valuation test.
    pub sector_avg_per: Option<f64>,
    /// Optional pre-scored sentiment impact in [-1.0, 1.0]. Surfaced in the
    /// report, never part of the composite.
    pub sentiment: Option<f64>,
}
