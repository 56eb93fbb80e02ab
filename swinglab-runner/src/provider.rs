//! Data provider seam and the in-memory fixture implementation.
//!
//! The pipeline never fetches or persists anything itself; collaborators
//! resolve typed data for an as-of date behind this trait. Provider
//! failures in phases 1–2 propagate to the caller (retryable when the
//! source was unreachable); in phase 3 they become per-candidate
//! exclusions.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use swinglab_core::domain::{CandidateBundle, MarketSnapshot, SectorUniverse};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The data source could not be reached; the caller may retry.
    #[error("data source unreachable: {0}")]
    Unreachable(String),
    /// The source answered but has no data for the request.
    #[error("no data for {0}")]
    NotFound(String),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Unreachable(_))
    }
}

/// External collaborator interface consumed by the pipeline.
pub trait DataProvider: Sync {
    fn market_snapshot(&self, as_of: NaiveDate) -> Result<MarketSnapshot, ProviderError>;
    fn sector_universe(&self, as_of: NaiveDate) -> Result<SectorUniverse, ProviderError>;
    fn candidate_bundle(
        &self,
        ticker: &str,
        as_of: NaiveDate,
    ) -> Result<CandidateBundle, ProviderError>;
}

/// Fully-resolved in-memory dataset, deserializable from JSON.
///
/// Used by the CLI (`--data fixture.json`) and by tests. The as-of date on
/// requests must match the snapshot's date; anything else is NotFound,
/// mirroring how a real adapter scopes its resolution to one date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureProvider {
    pub snapshot: Option<MarketSnapshot>,
    pub universe: Option<SectorUniverse>,
    pub bundles: BTreeMap<String, CandidateBundle>,
}

impl FixtureProvider {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn check_date(&self, as_of: NaiveDate) -> Result<(), ProviderError> {
        match &self.snapshot {
            Some(snap) if snap.as_of != as_of => Err(ProviderError::NotFound(format!(
                "as-of {as_of} (fixture holds {})",
                snap.as_of
            ))),
            _ => Ok(()),
        }
    }
}

impl DataProvider for FixtureProvider {
    fn market_snapshot(&self, as_of: NaiveDate) -> Result<MarketSnapshot, ProviderError> {
        self.check_date(as_of)?;
        self.snapshot
            .clone()
            .ok_or_else(|| ProviderError::NotFound(format!("market snapshot for {as_of}")))
    }

    fn sector_universe(&self, as_of: NaiveDate) -> Result<SectorUniverse, ProviderError> {
        self.check_date(as_of)?;
        self.universe
            .clone()
            .ok_or_else(|| ProviderError::NotFound(format!("sector universe for {as_of}")))
    }

    fn candidate_bundle(
        &self,
        ticker: &str,
        as_of: NaiveDate,
    ) -> Result<CandidateBundle, ProviderError> {
        self.check_date(as_of)?;
        self.bundles
            .get(ticker)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("candidate bundle for {ticker}")))
    }
}
