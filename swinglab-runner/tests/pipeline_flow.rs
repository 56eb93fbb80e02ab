//! End-to-end pipeline behavior: gate short-circuits, override semantics,
//! candidate isolation, and byte-identical reruns.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use swinglab_runner::{
    run_pipeline, sample_as_of, sample_fixture, DataProvider, FixtureProvider, PipelineConfig,
    PipelineError, PipelineRequest, ProviderError,
};

use swinglab_core::domain::{CandidateBundle, MarketRegime, MarketSnapshot, SectorUniverse};

/// Wraps a fixture and counts every provider call, so tests can assert
/// that short-circuited phases were never invoked at all.
struct CountingProvider {
    inner: FixtureProvider,
    snapshot_calls: AtomicUsize,
    universe_calls: AtomicUsize,
    bundle_calls: AtomicUsize,
}

impl CountingProvider {
    fn new(inner: FixtureProvider) -> Self {
        Self {
            inner,
            snapshot_calls: AtomicUsize::new(0),
            universe_calls: AtomicUsize::new(0),
            bundle_calls: AtomicUsize::new(0),
        }
    }
}

impl DataProvider for CountingProvider {
    fn market_snapshot(&self, as_of: NaiveDate) -> Result<MarketSnapshot, ProviderError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.market_snapshot(as_of)
    }

    fn sector_universe(&self, as_of: NaiveDate) -> Result<SectorUniverse, ProviderError> {
        self.universe_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.sector_universe(as_of)
    }

    fn candidate_bundle(
        &self,
        ticker: &str,
        as_of: NaiveDate,
    ) -> Result<CandidateBundle, ProviderError> {
        self.bundle_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.candidate_bundle(ticker, as_of)
    }
}

fn request() -> PipelineRequest {
    PipelineRequest {
        as_of: sample_as_of(),
        tickers: None,
        account_balance: 1.0e8,
        force_analysis: false,
    }
}

fn crash_fixture() -> FixtureProvider {
    let mut fixture = sample_fixture();
    let snapshot = fixture.snapshot.as_mut().unwrap();
    snapshot.vol_index_prev = 20.0;
    snapshot.vol_index = 22.0; // +10%, above the 5% spike bar
    snapshot.index_level = 2600.0;
    snapshot.index_ma20 = 2680.0;
    fixture
}

#[test]
fn crash_hard_stop_never_invokes_later_phases() {
    let provider = CountingProvider::new(crash_fixture());
    let report = run_pipeline(&provider, &request(), &PipelineConfig::default()).unwrap();

    assert!(report.halted);
    let decision = report.regime.unwrap();
    assert_eq!(decision.regime, MarketRegime::Crash);
    assert_eq!(decision.bet_multiplier, 0.0);
    assert!(report.sectors.is_empty());
    assert!(report.scores.is_empty());
    assert!(report.plans.is_empty());

    assert_eq!(provider.snapshot_calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.universe_calls.load(Ordering::SeqCst), 0);
    assert_eq!(provider.bundle_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn overbought_breadth_also_terminates() {
    let mut fixture = sample_fixture();
    fixture.snapshot.as_mut().unwrap().breadth_ratio = 135.0;
    let provider = CountingProvider::new(fixture);
    let report = run_pipeline(&provider, &request(), &PipelineConfig::default()).unwrap();

    assert!(report.halted);
    assert_eq!(report.regime.unwrap().regime, MarketRegime::Bear);
    assert_eq!(provider.universe_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn force_analysis_bypasses_regime_and_screen() {
    // Even with a crashing snapshot, the override goes straight to
    // phase 3 for the given tickers.
    let provider = CountingProvider::new(crash_fixture());
    let req = PipelineRequest {
        tickers: Some(vec!["005930".into(), "000660".into()]),
        force_analysis: true,
        ..request()
    };
    let report = run_pipeline(&provider, &req, &PipelineConfig::default()).unwrap();

    assert!(!report.halted);
    assert!(report.regime.is_none());
    assert_eq!(provider.snapshot_calls.load(Ordering::SeqCst), 0);
    assert_eq!(provider.universe_calls.load(Ordering::SeqCst), 0);
    assert_eq!(provider.bundle_calls.load(Ordering::SeqCst), 2);
    // Both candidates surface somewhere: ranked or discarded, never lost.
    assert_eq!(report.scores.len() + report.exclusions.len(), 2);
}

#[test]
fn force_analysis_without_tickers_is_an_error() {
    let provider = CountingProvider::new(sample_fixture());
    let req = PipelineRequest {
        force_analysis: true,
        ..request()
    };
    let err = run_pipeline(&provider, &req, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::MissingTickers));
    assert_eq!(provider.snapshot_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn explicit_tickers_without_force_still_face_the_gate() {
    let provider = CountingProvider::new(crash_fixture());
    let req = PipelineRequest {
        tickers: Some(vec!["005930".into()]),
        ..request()
    };
    let report = run_pipeline(&provider, &req, &PipelineConfig::default()).unwrap();
    assert!(report.halted);
    assert_eq!(provider.bundle_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn explicit_tickers_skip_only_the_screen() {
    let provider = CountingProvider::new(sample_fixture());
    let req = PipelineRequest {
        tickers: Some(vec!["005930".into(), "051910".into()]),
        ..request()
    };
    let report = run_pipeline(&provider, &req, &PipelineConfig::default()).unwrap();
    assert!(!report.halted);
    assert!(report.regime.is_some());
    assert!(report.sectors.is_empty());
    assert_eq!(provider.snapshot_calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.universe_calls.load(Ordering::SeqCst), 0);
    assert_eq!(provider.bundle_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn missing_bundle_is_isolated_to_its_candidate() {
    let mut fixture = sample_fixture();
    fixture.bundles.remove("000660");
    let provider = CountingProvider::new(fixture);
    let req = PipelineRequest {
        tickers: Some(vec!["005930".into(), "000660".into(), "051910".into()]),
        ..request()
    };
    let report = run_pipeline(&provider, &req, &PipelineConfig::default()).unwrap();

    let excluded: Vec<&str> = report
        .exclusions
        .iter()
        .map(|e| e.ticker.as_str())
        .collect();
    assert_eq!(excluded, ["000660"]);
    assert!(report.exclusions[0].reason.contains("data unavailable"));

    // The siblings were still evaluated and ranked (or discarded with a
    // reason of their own).
    let surfaced: Vec<&str> = report.scores.iter().map(|s| s.ticker.as_str()).collect();
    assert!(surfaced.contains(&"005930"));
    assert!(surfaced.contains(&"051910"));
}

#[test]
fn unreachable_snapshot_propagates_as_retryable() {
    struct DownProvider;
    impl DataProvider for DownProvider {
        fn market_snapshot(&self, _: NaiveDate) -> Result<MarketSnapshot, ProviderError> {
            Err(ProviderError::Unreachable("connection refused".into()))
        }
        fn sector_universe(&self, _: NaiveDate) -> Result<SectorUniverse, ProviderError> {
            unreachable!("phase 2 must not run when phase 1 failed")
        }
        fn candidate_bundle(
            &self,
            _: &str,
            _: NaiveDate,
        ) -> Result<CandidateBundle, ProviderError> {
            unreachable!("phase 3 must not run when phase 1 failed")
        }
    }

    let err = run_pipeline(&DownProvider, &request(), &PipelineConfig::default()).unwrap_err();
    match err {
        PipelineError::Provider(e) => assert!(e.is_retryable()),
        other => panic!("expected provider error, got {other}"),
    }
}

#[test]
fn expired_deadline_excludes_pending_candidates_without_failing() {
    let fixture = sample_fixture();
    let config = PipelineConfig {
        deadline_secs: Some(0), // already expired when phase 3 starts
        ..Default::default()
    };
    let req = PipelineRequest {
        tickers: Some(vec!["005930".into(), "051910".into()]),
        ..request()
    };
    let report = run_pipeline(&fixture, &req, &config).unwrap();

    assert_eq!(report.exclusions.len(), 2);
    for exclusion in &report.exclusions {
        assert!(exclusion.reason.contains("deadline"));
    }
    assert!(report.scores.is_empty());
    assert!(report.plans.is_empty());
}

#[test]
fn identical_runs_produce_byte_identical_reports() {
    let fixture = sample_fixture();
    let config = PipelineConfig::default();
    let report1 = run_pipeline(&fixture, &request(), &config).unwrap();
    let report2 = run_pipeline(&fixture, &request(), &config).unwrap();
    assert_eq!(
        report1.to_json().unwrap(),
        report2.to_json().unwrap()
    );
}

#[test]
fn concurrency_level_does_not_change_the_report() {
    let fixture = sample_fixture();
    let serial = PipelineConfig {
        max_concurrency: 1,
        ..Default::default()
    };
    let parallel = PipelineConfig {
        max_concurrency: 8,
        ..Default::default()
    };
    let report1 = run_pipeline(&fixture, &request(), &serial).unwrap();
    let report2 = run_pipeline(&fixture, &request(), &parallel).unwrap();

    // The run id covers the config, so compare the phase outputs directly.
    assert_eq!(report1.sectors, report2.sectors);
    assert_eq!(report1.exclusions, report2.exclusions);
    assert_eq!(report1.scores, report2.scores);
    assert_eq!(report1.plans, report2.plans);
}

#[test]
fn full_run_accounts_for_every_screened_candidate() {
    let fixture = sample_fixture();
    let report = run_pipeline(&fixture, &request(), &PipelineConfig::default()).unwrap();

    assert!(!report.halted);
    assert!(!report.sectors.is_empty());
    assert!(report.sectors.len() <= 3);

    // Every screened ticker lands in exactly one of: scores or exclusions.
    let screened: usize = {
        let mut tickers: Vec<&str> = Vec::new();
        for sector in &report.sectors {
            for t in &sector.tickers {
                if !tickers.contains(&t.as_str()) {
                    tickers.push(t);
                }
            }
        }
        tickers.len()
    };
    assert_eq!(report.scores.len() + report.exclusions.len(), screened);

    // Discards carry reasons; nothing is silently dropped.
    for score in &report.scores {
        assert!(score.is_selected() || score.discard_reason.is_some());
    }
}
