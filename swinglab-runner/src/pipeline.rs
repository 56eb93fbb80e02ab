//! Pipeline orchestration — five phases with short-circuit gates.
//!
//! Phases 1–2 and 4–5 run sequentially; phase 3 fans candidates out over a
//! bounded worker pool, with each candidate's three evaluators joined
//! concurrently. A regime hard stop ends the run before phase 2 is ever
//! invoked. Per-candidate failures are isolated as recorded exclusions and
//! never abort siblings.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use swinglab_core::domain::{CandidateBundle, RegimeDecision, SectorCandidate};
use swinglab_core::flow::FlowEvaluator;
use swinglab_core::fundamental::FundamentalEvaluator;
use swinglab_core::indicators::atr;
use swinglab_core::ranker::{CandidateAssessments, Ranker};
use swinglab_core::regime::{RegimeError, RegimeGate};
use swinglab_core::risk::RiskPlanner;
use swinglab_core::sector::{candidate_tickers, SectorScreener};
use swinglab_core::technical::TechnicalEvaluator;

use crate::config::{ConfigError, PipelineConfig};
use crate::fingerprint::run_id;
use crate::provider::{DataProvider, ProviderError};
use crate::report::{Exclusion, Report};

/// One pipeline invocation, keyed by as-of date and ticker set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub as_of: NaiveDate,
    /// Explicit candidate list. Skips the sector screen; with
    /// `force_analysis` it also bypasses the regime gate.
    pub tickers: Option<Vec<String>>,
    pub account_balance: f64,
    /// Documented override: evaluate the given tickers directly, bypassing
    /// phases 1–2 including regime hard stops.
    pub force_analysis: bool,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("regime gate: {0}")]
    Regime(#[from] RegimeError),
    #[error("force_analysis requires an explicit ticker list")]
    MissingTickers,
    #[error("worker pool: {0}")]
    WorkerPool(String),
}

/// Phase-3 result for one candidate: either the three assessments plus the
/// context the risk planner needs, or a recorded exclusion.
enum CandidateOutcome {
    Evaluated(Box<EvaluatedCandidate>),
    Excluded(Exclusion),
}

struct EvaluatedCandidate {
    assessments: CandidateAssessments,
    atr_14: f64,
    sentiment: Option<f64>,
}

/// Run the full pipeline against `provider` for one request.
pub fn run_pipeline(
    provider: &dyn DataProvider,
    request: &PipelineRequest,
    config: &PipelineConfig,
) -> Result<Report, PipelineError> {
    config.validate()?;
    if request.force_analysis && request.tickers.is_none() {
        return Err(PipelineError::MissingTickers);
    }
    let id = run_id(request, config);
    let evaluation = &config.evaluation;
    let deadline = config
        .deadline_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    // ── Phase 1: regime gate ─────────────────────────────────────────
    let regime: Option<RegimeDecision> = if request.force_analysis {
        info!(run_id = %id, "force_analysis set: bypassing regime gate and sector screen");
        None
    } else {
        let snapshot = provider.market_snapshot(request.as_of)?;
        let decision = RegimeGate::new(&evaluation.regime).evaluate(&snapshot)?;
        info!(
            regime = ?decision.regime,
            bet_multiplier = decision.bet_multiplier,
            reason = %decision.reason,
            "phase 1 complete"
        );
        if !decision.is_tradable() {
            // Hard stop: phases 2-5 are never invoked.
            return Ok(Report::halted(id, request, decision));
        }
        Some(decision)
    };

    // ── Phase 2: sector screen (or explicit ticker override) ────────
    let (sectors, tickers): (Vec<SectorCandidate>, Vec<String>) = match &request.tickers {
        Some(explicit) => (Vec::new(), explicit.clone()),
        None => {
            let universe = provider.sector_universe(request.as_of)?;
            let sectors = SectorScreener::new(&evaluation.sector).screen(&universe);
            let tickers = candidate_tickers(&sectors);
            info!(
                sectors = sectors.len(),
                candidates = tickers.len(),
                "phase 2 complete"
            );
            (sectors, tickers)
        }
    };

    // ── Phase 3: parallel deep dive ──────────────────────────────────
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_concurrency)
        .build()
        .map_err(|e| PipelineError::WorkerPool(e.to_string()))?;
    let outcomes: Vec<CandidateOutcome> = pool.install(|| {
        use rayon::prelude::*;
        tickers
            .par_iter()
            .map(|ticker| evaluate_candidate(provider, ticker, request.as_of, config, deadline))
            .collect()
    });

    let mut evaluated: Vec<EvaluatedCandidate> = Vec::new();
    let mut exclusions: Vec<Exclusion> = Vec::new();
    for outcome in outcomes {
        match outcome {
            CandidateOutcome::Evaluated(candidate) => evaluated.push(*candidate),
            CandidateOutcome::Excluded(exclusion) => {
                warn!(ticker = %exclusion.ticker, reason = %exclusion.reason, "candidate excluded");
                exclusions.push(exclusion);
            }
        }
    }
    info!(
        evaluated = evaluated.len(),
        excluded = exclusions.len(),
        "phase 3 complete"
    );

    // ── Phase 4: fuse and rank ───────────────────────────────────────
    let assessments: Vec<CandidateAssessments> =
        evaluated.iter().map(|c| c.assessments.clone()).collect();
    let scores = Ranker::new(&evaluation.ranker).rank(&assessments);

    // ── Phase 5: trade plans for the selected candidates ─────────────
    let planner = RiskPlanner::new(&evaluation.risk);
    let plans = scores
        .iter()
        .filter(|s| s.is_selected())
        .filter_map(|s| {
            evaluated
                .iter()
                .find(|c| c.assessments.ticker() == s.ticker)
        })
        .map(|c| {
            planner.plan(
                &c.assessments.technical,
                &c.assessments.fundamental,
                &c.assessments.flow,
                c.atr_14,
                request.account_balance,
            )
        })
        .collect::<Vec<_>>();
    info!(plans = plans.len(), "phase 5 complete");

    let sentiment = evaluated
        .iter()
        .filter_map(|c| {
            c.sentiment
                .map(|score| (c.assessments.ticker().to_string(), score))
        })
        .collect();

    Ok(Report {
        schema_version: crate::report::SCHEMA_VERSION,
        run_id: id,
        as_of: request.as_of,
        account_balance: request.account_balance,
        force_analysis: request.force_analysis,
        halted: false,
        regime,
        sectors,
        exclusions,
        scores,
        plans,
        sentiment,
    })
}

fn evaluate_candidate(
    provider: &dyn DataProvider,
    ticker: &str,
    as_of: NaiveDate,
    config: &PipelineConfig,
    deadline: Option<Instant>,
) -> CandidateOutcome {
    if let Some(deadline) = deadline {
        if Instant::now() >= deadline {
            return CandidateOutcome::Excluded(Exclusion {
                ticker: ticker.to_string(),
                reason: "pipeline deadline exceeded before evaluation".to_string(),
            });
        }
    }

    let bundle: CandidateBundle = match provider.candidate_bundle(ticker, as_of) {
        Ok(bundle) => bundle,
        Err(e) => {
            return CandidateOutcome::Excluded(Exclusion {
                ticker: ticker.to_string(),
                reason: format!("data unavailable: {e}"),
            })
        }
    };

    let evaluation = &config.evaluation;
    // The three evaluators share nothing mutable; join them concurrently.
    let (technical, (fundamental, flow)) = rayon::join(
        || TechnicalEvaluator::new(&evaluation.technical).assess(ticker, &bundle.bars),
        || {
            rayon::join(
                || {
                    FundamentalEvaluator::new(&evaluation.fundamental).assess(
                        ticker,
                        bundle.financials.as_ref(),
                        bundle.disclosures.as_deref(),
                        bundle.sector_avg_per,
                        as_of,
                    )
                },
                || {
                    FlowEvaluator::new(&evaluation.flow).assess(
                        ticker,
                        &bundle.flows,
                        &bundle.broker_window,
                    )
                },
            )
        },
    );

    let technical = match technical {
        Ok(assessment) => assessment,
        Err(e) => {
            return CandidateOutcome::Excluded(Exclusion {
                ticker: ticker.to_string(),
                reason: e.to_string(),
            })
        }
    };
    let flow = match flow {
        Ok(assessment) => assessment,
        Err(e) => {
            return CandidateOutcome::Excluded(Exclusion {
                ticker: ticker.to_string(),
                reason: e.to_string(),
            })
        }
    };

    let atr_14 = atr(&bundle.bars, evaluation.risk.atr_period)
        .last()
        .copied()
        .unwrap_or(f64::NAN);

    debug!(
        ticker,
        technical_score = technical.score,
        fundamental = ?fundamental.verdict,
        flow = ?flow.level,
        "candidate evaluated"
    );

    CandidateOutcome::Evaluated(Box::new(EvaluatedCandidate {
        assessments: CandidateAssessments {
            technical,
            fundamental,
            flow,
        },
        atr_14,
        sentiment: bundle.sentiment,
    }))
}
