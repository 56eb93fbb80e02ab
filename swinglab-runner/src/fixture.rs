//! Deterministic synthetic fixture for demos and tests.
//!
//! No randomness: every series is a fixed wave keyed off its index, so two
//! generations are identical and pipeline runs over the fixture are
//! reproducible. The dataset is small but exercises every phase: a normal
//! regime, four sectors with members on both sides of the primary filter,
//! and bundles whose fundamentals range from clean passes to a blacklist
//! hit.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use swinglab_core::domain::{
    Bar, BrokerVolume, CandidateBundle, Disclosure, DisclosureCategory, FinancialRecord, FlowDay,
    MarketSnapshot, SectorMember, SectorSeries, SectorUniverse,
};

use crate::provider::FixtureProvider;

/// As-of date the fixture resolves for.
pub fn sample_as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

/// Build the full in-memory dataset.
pub fn sample_fixture() -> FixtureProvider {
    let as_of = sample_as_of();

    let snapshot = MarketSnapshot {
        as_of,
        breadth_ratio: 98.0,
        vol_index: 17.2,
        vol_index_prev: 17.5,
        index_level: 2720.0,
        index_ma20: 2680.0,
        fx_index_corr: -0.35,
    };

    let benchmark = wave_bars("KOSPI", as_of, 2700.0, 0.02, 30.0, 25, 400_000);

    let sectors = vec![
        SectorSeries {
            code: "0010".into(),
            name: "Electronics".into(),
            bars: wave_bars("S0010", as_of, 3400.0, 0.12, 40.0, 21, 900_000),
            members: vec![
                member("005930", as_of, 9.0e14, 71_000.0, 0.10),
                member("000660", as_of, 1.2e14, 185_000.0, 0.14),
                member("035420", as_of, 3.0e13, 192_000.0, 0.08),
                member("042700", as_of, 2.0e12, 31_000.0, 0.18),
            ],
        },
        SectorSeries {
            code: "0005".into(),
            name: "Chemicals".into(),
            bars: wave_bars("S0005", as_of, 5100.0, 0.06, 60.0, 19, 600_000),
            members: vec![
                member("051910", as_of, 4.0e13, 390_000.0, 0.05),
                member("011170", as_of, 6.0e12, 142_000.0, 0.07),
            ],
        },
        SectorSeries {
            code: "0009".into(),
            name: "Machinery".into(),
            bars: wave_bars("S0009", as_of, 1900.0, 0.03, 25.0, 17, 300_000),
            members: vec![member("042670", as_of, 4.0e12, 78_000.0, 0.04)],
        },
        SectorSeries {
            code: "0013".into(),
            name: "Retail".into(),
            bars: wave_bars("S0013", as_of, 800.0, -0.04, 12.0, 23, 200_000),
            members: vec![member("139480", as_of, 3.0e12, 64_000.0, -0.05)],
        },
    ];

    let mut bundles = BTreeMap::new();
    let tickers = [
        "005930", "000660", "035420", "042700", "051910", "011170", "042670", "139480",
    ];
    for (i, ticker) in tickers.iter().enumerate() {
        bundles.insert(ticker.to_string(), bundle(ticker, as_of, i));
    }
    // One blacklist hit to exercise the disclosure gate.
    if let Some(bundle) = bundles.get_mut("139480") {
        bundle.disclosures = Some(vec![Disclosure {
            category: DisclosureCategory::UnfaithfulDisclosure,
            date: as_of - chrono::Duration::days(40),
        }]);
    }
    // One candidate with a missing statement record.
    if let Some(bundle) = bundles.get_mut("042670") {
        bundle.financials = None;
    }

    FixtureProvider {
        snapshot: Some(snapshot),
        universe: Some(SectorUniverse { benchmark, sectors }),
        bundles,
    }
}

/// 80 sessions of drifting, gently oscillating tape ending at `as_of`.
fn wave_bars(
    symbol: &str,
    as_of: NaiveDate,
    base: f64,
    drift: f64,
    amplitude: f64,
    period: usize,
    volume: u64,
) -> Vec<Bar> {
    let n = 80usize;
    (0..n)
        .map(|i| {
            let progress = i as f64 / n as f64;
            let phase = i as f64 * std::f64::consts::TAU / period as f64;
            let close = base * (1.0 + drift * progress) + amplitude * phase.sin();
            let spread = amplitude * 0.3 + base * 0.004;
            Bar {
                symbol: symbol.to_string(),
                date: as_of - chrono::Duration::days((n - 1 - i) as i64),
                open: close - spread * 0.3,
                high: close + spread,
                low: close - spread,
                close,
                volume,
                value: close * volume as f64,
            }
        })
        .collect()
}

fn member(ticker: &str, as_of: NaiveDate, market_cap: f64, base: f64, drift: f64) -> SectorMember {
    SectorMember {
        ticker: ticker.to_string(),
        market_cap,
        bars: wave_bars(ticker, as_of, base, drift, base * 0.015, 22, 250_000),
    }
}

fn bundle(ticker: &str, as_of: NaiveDate, seed: usize) -> CandidateBundle {
    let base = 40_000.0 + seed as f64 * 11_000.0;
    let bars = wave_bars(ticker, as_of, base, 0.10, base * 0.02, 20, 180_000);

    let flows: Vec<FlowDay> = (0..12)
        .map(|i| {
            let sign = if (i + seed) % 3 == 0 { -1.0 } else { 1.0 };
            FlowDay {
                date: as_of - chrono::Duration::days(11 - i as i64),
                foreign_net: sign * 40_000.0,
                institution_net: sign * 25_000.0,
                retail_net: -sign * 65_000.0,
                program_non_arb_net: sign * 15_000.0,
            }
        })
        .collect();

    let broker_window = vec![
        BrokerVolume {
            broker: "Goldman Sachs".into(),
            buy_volume: 90_000.0 + seed as f64 * 5_000.0,
        },
        BrokerVolume {
            broker: "JP Morgan".into(),
            buy_volume: 70_000.0,
        },
        BrokerVolume {
            broker: "Kiwoom".into(),
            buy_volume: 60_000.0,
        },
    ];

    // Seeds cycle through strong, middling, and weak statements.
    let financials = FinancialRecord {
        roa: Some(0.05 + 0.01 * (seed % 4) as f64),
        roa_prev: Some(0.05),
        operating_cash_flow: Some(4_000.0 + 500.0 * seed as f64),
        net_income: Some(3_500.0),
        long_term_debt_ratio: Some(0.22),
        long_term_debt_ratio_prev: Some(if seed % 3 == 0 { 0.20 } else { 0.26 }),
        current_ratio: Some(1.7),
        current_ratio_prev: Some(if seed % 2 == 0 { 1.5 } else { 1.9 }),
        shares_outstanding: Some(10_000.0),
        shares_outstanding_prev: Some(10_000.0),
        gross_margin: Some(0.33),
        gross_margin_prev: Some(0.31),
        asset_turnover: Some(0.92),
        asset_turnover_prev: Some(0.88),
        per: Some(8.0 + seed as f64),
        peg: Some(1.1 + 0.1 * (seed % 5) as f64),
        cb_overhang_pct: Some(if seed == 3 { 6.0 } else { 0.0 }),
    };

    CandidateBundle {
        ticker: ticker.to_string(),
        sector_code: None,
        bars,
        flows,
        broker_window,
        financials: Some(financials),
        disclosures: Some(Vec::new()),
        sector_avg_per: Some(14.0),
        sentiment: Some(((seed % 5) as f64 - 2.0) / 4.0),
    }
}
