//! SwingLab Core — staged candidate evaluation and risk-managed trade setup.
//!
//! This crate contains the deterministic heart of the pipeline:
//! - Domain types (bars, snapshots, bundles, assessments, plans)
//! - Regime gate with the volatility hard stop
//! - Sector relative-strength screen with trickle-down derivation
//! - Three independent deep-dive evaluators (technical / fundamental / flow)
//! - Score fusion and deterministic ranking
//! - ATR-based risk planner with the stop ratchet invariant
//!
//! Everything here is pure: no I/O, no clock reads, no randomness. The
//! orchestration layer feeds already-resolved data in and serializes the
//! results out.

pub mod config;
pub mod domain;
pub mod error;
pub mod flow;
pub mod fundamental;
pub mod indicators;
pub mod ranker;
pub mod regime;
pub mod risk;
pub mod sector;
pub mod technical;

pub use error::EvaluatorError;
