//! Domain value objects shared by every pipeline phase.
//!
//! All of these are created fresh per run and never mutated afterwards;
//! later phases reference earlier outputs, they do not alter them.

pub mod assessment;
pub mod bar;
pub mod candidate;
pub mod plan;
pub mod sector;
pub mod snapshot;

pub use assessment::{
    CompositeScore, Contraction, FlowAssessment, FlowLevel, FundamentalAssessment,
    FundamentalVerdict, OrderBlock, TechnicalAssessment, VcpPattern,
};
pub use bar::Bar;
pub use candidate::{
    BrokerVolume, CandidateBundle, Disclosure, DisclosureCategory, FinancialRecord, FlowDay,
};
pub use plan::{EntryZone, PlanVerdict, PyramidTier, TradePlan};
pub use sector::{SectorCandidate, SectorMember, SectorSeries, SectorUniverse};
pub use snapshot::{MarketRegime, MarketSnapshot, RegimeDecision};
