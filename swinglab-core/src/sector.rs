//! Sector screen — relative-strength ranking and candidate derivation.
//!
//! RS score = 0.5·α(1w) + 0.3·α(1m) + 0.2·α(3m), alpha measured against the
//! benchmark over the same window. The top sectors are retained with a
//! fully deterministic order: RS descending, then 1-month alpha descending,
//! then sector code. Members failing the trading-value / MA filter are
//! excluded from the ticker list outright, not scored low.

use crate::config::SectorThresholds;
use crate::domain::{Bar, SectorCandidate, SectorMember, SectorSeries, SectorUniverse};
use crate::indicators::{sma, window_return};

pub struct SectorScreener<'a> {
    thresholds: &'a SectorThresholds,
}

struct WindowAlphas {
    alpha_1w: f64,
    alpha_1m: f64,
    alpha_3m: f64,
}

impl<'a> SectorScreener<'a> {
    pub fn new(thresholds: &'a SectorThresholds) -> Self {
        Self { thresholds }
    }

    /// Rank sectors and derive their candidate tickers.
    pub fn screen(&self, universe: &SectorUniverse) -> Vec<SectorCandidate> {
        let t = self.thresholds;
        let bench_closes = closes(&universe.benchmark);
        let bench_1w = window_return(&bench_closes, t.sessions_1w).unwrap_or(0.0);
        let bench_1m = window_return(&bench_closes, t.sessions_1m).unwrap_or(0.0);
        let bench_3m = window_return(&bench_closes, t.sessions_3m).unwrap_or(0.0);

        let mut scored: Vec<(&SectorSeries, WindowAlphas, f64)> = universe
            .sectors
            .iter()
            .filter_map(|sector| {
                let sector_closes = closes(&sector.bars);
                let r1w = window_return(&sector_closes, t.sessions_1w)?;
                let r1m = window_return(&sector_closes, t.sessions_1m)?;
                let r3m = window_return(&sector_closes, t.sessions_3m)?;
                let alphas = WindowAlphas {
                    alpha_1w: r1w - bench_1w,
                    alpha_1m: r1m - bench_1m,
                    alpha_3m: r3m - bench_3m,
                };
                let rs = t.weight_1w * alphas.alpha_1w
                    + t.weight_1m * alphas.alpha_1m
                    + t.weight_3m * alphas.alpha_3m;
                Some((sector, alphas, rs))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.2.total_cmp(&a.2)
                .then(b.1.alpha_1m.total_cmp(&a.1.alpha_1m))
                .then(a.0.code.cmp(&b.0.code))
        });
        scored.truncate(t.top_sectors);

        scored
            .into_iter()
            .map(|(sector, alphas, rs)| self.build_candidate(sector, alphas, rs))
            .collect()
    }

    fn build_candidate(
        &self,
        sector: &SectorSeries,
        alphas: WindowAlphas,
        rs_score: f64,
    ) -> SectorCandidate {
        let t = self.thresholds;

        let large_caps = top_by_market_cap(&sector.members, t.large_cap_count);
        let large_caps_confirmed = !large_caps.is_empty()
            && large_caps.iter().all(|m| above_ma(&m.bars, t.sessions_1m));
        let volume_surged = volume_surge(&sector.bars, t.sessions_1w, t.volume_surge_ratio);
        let trickle_down_ready = large_caps_confirmed && volume_surged;

        let large_cap_tickers: Vec<&str> =
            large_caps.iter().map(|m| m.ticker.as_str()).collect();

        let mut tickers = Vec::new();
        let mut priority_tickers = Vec::new();
        for member in &sector.members {
            if !self.passes_primary_filter(member) {
                continue;
            }
            tickers.push(member.ticker.clone());
            if trickle_down_ready
                && !large_cap_tickers.contains(&member.ticker.as_str())
                && self.fresh_impulse(member)
            {
                priority_tickers.push(member.ticker.clone());
            }
        }

        SectorCandidate {
            code: sector.code.clone(),
            name: sector.name.clone(),
            rs_score,
            alpha_1w: alphas.alpha_1w,
            alpha_1m: alphas.alpha_1m,
            alpha_3m: alphas.alpha_3m,
            trickle_down_ready,
            tickers,
            priority_tickers,
        }
    }

    /// Trading value above the floor and close above the filter MA.
    fn passes_primary_filter(&self, member: &SectorMember) -> bool {
        let t = self.thresholds;
        let last = match member.bars.last() {
            Some(bar) => bar,
            None => return false,
        };
        if last.value < t.min_trading_value {
            return false;
        }
        let member_closes = closes(&member.bars);
        let ma = sma(&member_closes, t.ma_filter_window);
        match ma.last() {
            Some(&m) if m.is_finite() => last.close > m * t.ma60_slack,
            _ => false,
        }
    }

    /// A fresh upward impulse on the latest session: close change above the
    /// impulse floor with volume above its 20-day average.
    fn fresh_impulse(&self, member: &SectorMember) -> bool {
        let t = self.thresholds;
        let n = member.bars.len();
        if n < 2 {
            return false;
        }
        let last = &member.bars[n - 1];
        let prev_close = member.bars[n - 2].close;
        if prev_close <= 0.0 {
            return false;
        }
        let change_pct = (last.close / prev_close - 1.0) * 100.0;
        if change_pct < t.impulse_min_pct {
            return false;
        }
        let volumes: Vec<f64> = member.bars.iter().map(|b| b.volume as f64).collect();
        let vol_ma = sma(&volumes, t.sessions_1m);
        match vol_ma.last() {
            Some(&m) if m.is_finite() && m > 0.0 => {
                last.volume as f64 >= t.impulse_volume_ratio * m
            }
            _ => false,
        }
    }
}

/// Flatten retained sectors into one candidate list: priority movers first,
/// then the rest, first occurrence wins.
pub fn candidate_tickers(sectors: &[SectorCandidate]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for sector in sectors {
        for ticker in &sector.priority_tickers {
            if !out.contains(ticker) {
                out.push(ticker.clone());
            }
        }
    }
    for sector in sectors {
        for ticker in &sector.tickers {
            if !out.contains(ticker) {
                out.push(ticker.clone());
            }
        }
    }
    out
}

fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

fn top_by_market_cap(members: &[SectorMember], count: usize) -> Vec<&SectorMember> {
    let mut sorted: Vec<&SectorMember> = members.iter().collect();
    sorted.sort_by(|a, b| {
        b.market_cap
            .total_cmp(&a.market_cap)
            .then(a.ticker.cmp(&b.ticker))
    });
    sorted.truncate(count);
    sorted
}

fn above_ma(bars: &[Bar], window: usize) -> bool {
    let series = closes(bars);
    let ma = sma(&series, window);
    match (series.last(), ma.last()) {
        (Some(&close), Some(&m)) if m.is_finite() => close > m,
        _ => false,
    }
}

/// Trailing-week sector volume against the prior week.
fn volume_surge(bars: &[Bar], week: usize, ratio: f64) -> bool {
    if bars.len() < week * 2 {
        return false;
    }
    let n = bars.len();
    let recent: u64 = bars[n - week..].iter().map(|b| b.volume).sum();
    let prior: u64 = bars[n - week * 2..n - week].iter().map(|b| b.volume).sum();
    if prior == 0 {
        return recent > 0;
    }
    recent as f64 >= prior as f64 * ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars_from(symbol: &str, closes: &[f64], volume: u64, value: f64) -> Vec<Bar> {
        let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                symbol: symbol.to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume,
                value,
            })
            .collect()
    }

    /// Closes of length 61 with chosen window returns (benchmark flat at 100
    /// makes returns equal alphas).
    fn closes_with_returns(r1w: f64, r1m: f64, r3m: f64) -> Vec<f64> {
        let last = 100.0;
        let mut closes = vec![last; 61];
        closes[55] = last / (1.0 + r1w); // 5 sessions back
        closes[40] = last / (1.0 + r1m); // 20 sessions back
        closes[0] = last / (1.0 + r3m); // 60 sessions back
        closes
    }

    fn sector(code: &str, closes: &[f64]) -> SectorSeries {
        SectorSeries {
            code: code.to_string(),
            name: format!("Sector {code}"),
            bars: bars_from(code, closes, 1000, 1.0),
            members: Vec::new(),
        }
    }

    fn universe(sectors: Vec<SectorSeries>) -> SectorUniverse {
        SectorUniverse {
            benchmark: bars_from("BENCH", &vec![100.0; 61], 1000, 1.0),
            sectors,
        }
    }

    #[test]
    fn retains_at_most_top_three_sorted_descending() {
        let t = SectorThresholds::default();
        let screener = SectorScreener::new(&t);
        let sectors = vec![
            sector("04", &closes_with_returns(0.01, 0.0, 0.0)),
            sector("01", &closes_with_returns(0.08, 0.0, 0.0)),
            sector("02", &closes_with_returns(0.06, 0.0, 0.0)),
            sector("03", &closes_with_returns(0.04, 0.0, 0.0)),
        ];
        let out = screener.screen(&universe(sectors));
        assert_eq!(out.len(), 3);
        let codes: Vec<&str> = out.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, ["01", "02", "03"]);
        assert!(out[0].rs_score > out[1].rs_score);
        assert!(out[1].rs_score > out[2].rs_score);
    }

    /// Closes of length 61 with exact window bases so the returns come out
    /// bit-exact (150/100 − 1 = 0.5 has no rounding).
    fn closes_with_bases(last: f64, b1w: f64, b1m: f64, b3m: f64) -> Vec<f64> {
        let mut closes = vec![last; 61];
        closes[55] = b1w;
        closes[40] = b1m;
        closes[0] = b3m;
        closes
    }

    #[test]
    fn exact_tie_prefers_higher_one_month_alpha() {
        let t = SectorThresholds::default();
        let screener = SectorScreener::new(&t);
        // Both score RS = 0.25 exactly: A from the 1-week leg alone
        // (0.5×0.5), B from the 1m+3m legs (0.3×0.5 + 0.2×0.5).
        let a = sector("A", &closes_with_bases(150.0, 100.0, 150.0, 150.0));
        let b = sector("B", &closes_with_bases(150.0, 150.0, 100.0, 100.0));
        let out = screener.screen(&universe(vec![a, b]));
        assert_eq!(out[0].rs_score.to_bits(), out[1].rs_score.to_bits());
        assert_eq!(out[0].code, "B");
    }

    #[test]
    fn tie_on_alpha_falls_back_to_code_order() {
        let t = SectorThresholds::default();
        let screener = SectorScreener::new(&t);
        let a = sector("Z", &closes_with_returns(0.05, 0.02, 0.01));
        let b = sector("A", &closes_with_returns(0.05, 0.02, 0.01));
        let out = screener.screen(&universe(vec![a, b]));
        assert_eq!(out[0].code, "A");
    }

    fn member(ticker: &str, cap: f64, closes: &[f64], volume: u64, value: f64) -> SectorMember {
        SectorMember {
            ticker: ticker.to_string(),
            market_cap: cap,
            bars: bars_from(ticker, closes, volume, value),
        }
    }

    fn rising_closes(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.1).collect()
    }

    #[test]
    fn primary_filter_excludes_thin_or_below_ma_members() {
        let t = SectorThresholds::default();
        let screener = SectorScreener::new(&t);
        let mut sec = sector("01", &closes_with_returns(0.05, 0.0, 0.0));
        // Rising closes keep the last close above MA60.
        sec.members = vec![
            member("AAA", 1.0e12, &rising_closes(70), 10_000, 2.0e10),
            // Trading value below the 10B floor.
            member("BBB", 1.0e12, &rising_closes(70), 10_000, 5.0e9),
            // Falling closes: last close under MA60 × slack.
            member(
                "CCC",
                1.0e12,
                &(0..70).map(|i| 200.0 - i as f64).collect::<Vec<_>>(),
                10_000,
                2.0e10,
            ),
        ];
        let out = screener.screen(&universe(vec![sec]));
        assert_eq!(out[0].tickers, vec!["AAA".to_string()]);
    }

    #[test]
    fn trickle_down_needs_large_caps_and_volume_surge() {
        let t = SectorThresholds::default();
        let screener = SectorScreener::new(&t);

        let mut sec = sector("01", &closes_with_returns(0.05, 0.0, 0.0));
        // Sector volume: prior week 1000/day, trailing week 1500/day.
        for (i, bar) in sec.bars.iter_mut().enumerate() {
            bar.volume = if i >= 61 - 5 { 1500 } else { 1000 };
        }
        sec.members = vec![
            member("BIG1", 9.0e12, &rising_closes(70), 10_000, 2.0e10),
            member("BIG2", 8.0e12, &rising_closes(70), 10_000, 2.0e10),
            member("BIG3", 7.0e12, &rising_closes(70), 10_000, 2.0e10),
            member("SML1", 1.0e11, &rising_closes(70), 10_000, 2.0e10),
        ];
        let out = screener.screen(&universe(vec![sec.clone()]));
        assert!(out[0].trickle_down_ready);
        // SML1 has no fresh impulse (0.1 drift < 2%), so no priority flag.
        assert!(out[0].priority_tickers.is_empty());

        // Give the small cap an impulse session: +5% close on 2x volume.
        let mut impulse_closes = rising_closes(70);
        let last = impulse_closes[68] * 1.05;
        impulse_closes[69] = last;
        let mut sml = member("SML1", 1.0e11, &impulse_closes, 10_000, 2.0e10);
        sml.bars.last_mut().unwrap().volume = 20_000;
        sec.members[3] = sml;
        let out = screener.screen(&universe(vec![sec.clone()]));
        assert_eq!(out[0].priority_tickers, vec!["SML1".to_string()]);

        // Without the volume surge the flag drops even with the impulse.
        for bar in sec.bars.iter_mut() {
            bar.volume = 1000;
        }
        let out = screener.screen(&universe(vec![sec]));
        assert!(!out[0].trickle_down_ready);
        assert!(out[0].priority_tickers.is_empty());
    }

    #[test]
    fn candidate_list_puts_priority_movers_first() {
        let sectors = vec![
            SectorCandidate {
                code: "01".into(),
                name: "One".into(),
                rs_score: 0.05,
                alpha_1w: 0.0,
                alpha_1m: 0.0,
                alpha_3m: 0.0,
                trickle_down_ready: true,
                tickers: vec!["AAA".into(), "BBB".into()],
                priority_tickers: vec!["BBB".into()],
            },
            SectorCandidate {
                code: "02".into(),
                name: "Two".into(),
                rs_score: 0.03,
                alpha_1w: 0.0,
                alpha_1m: 0.0,
                alpha_3m: 0.0,
                trickle_down_ready: false,
                tickers: vec!["CCC".into(), "AAA".into()],
                priority_tickers: vec![],
            },
        ];
        let tickers = candidate_tickers(&sectors);
        assert_eq!(tickers, vec!["BBB", "AAA", "CCC"]);
    }
}
