//! Fundamental deep-dive evaluator.
//!
//! Three gates: Piotroski F-score, sector-relative valuation, and the
//! disclosure blacklist. The verdict is binary — PASS needs all three to
//! hold. The F-score requires every one of its nine inputs; a gap there is
//! a FAIL with reason "insufficient data", not an error. A missing
//! disclosure feed degrades to a warning, since absence of the feed is not
//! evidence of risk.

use chrono::NaiveDate;

use crate::config::FundamentalThresholds;
use crate::domain::{
    Disclosure, FinancialRecord, FundamentalAssessment, FundamentalVerdict,
};

pub struct FundamentalEvaluator<'a> {
    thresholds: &'a FundamentalThresholds,
}

impl<'a> FundamentalEvaluator<'a> {
    pub fn new(thresholds: &'a FundamentalThresholds) -> Self {
        Self { thresholds }
    }

    pub fn assess(
        &self,
        ticker: &str,
        financials: Option<&FinancialRecord>,
        disclosures: Option<&[Disclosure]>,
        sector_avg_per: Option<f64>,
        as_of: NaiveDate,
    ) -> FundamentalAssessment {
        let t = self.thresholds;
        let mut warnings = Vec::new();

        let f_score = financials.and_then(f_score);
        let relative_per = financials
            .and_then(|f| f.per)
            .zip(sector_avg_per.filter(|&avg| avg > 0.0))
            .map(|(per, avg)| per / avg);
        let peg = financials.and_then(|f| f.peg);

        if let Some(overhang) = financials.and_then(|f| f.cb_overhang_pct) {
            if overhang >= t.cb_overhang_warn_pct {
                warnings.push(format!(
                    "convertible-bond overhang {overhang:.1}% of market cap"
                ));
            }
        }

        // Blacklist check first: it overrides everything else.
        let blacklist_hit = match disclosures {
            Some(list) => list
                .iter()
                .filter(|d| within_window(d.date, as_of, t.blacklist_window_days))
                .min_by_key(|d| d.date),
            None => {
                warnings.push("disclosure feed unavailable".to_string());
                None
            }
        };

        let fail_reason = if let Some(hit) = blacklist_hit {
            Some(format!(
                "blacklist disclosure: {} on {}",
                hit.category.label(),
                hit.date
            ))
        } else {
            match f_score {
                None => Some("insufficient data".to_string()),
                Some(score) if score < t.hard_fail_f_score => {
                    Some(format!("F-score {score} below hard floor {}", t.hard_fail_f_score))
                }
                Some(score) if score < t.pass_f_score => {
                    Some(format!("F-score {score} below pass threshold {}", t.pass_f_score))
                }
                Some(_) => match (relative_per, peg) {
                    (Some(rel), Some(p)) => {
                        if rel < t.max_relative_per && p < t.max_peg {
                            None
                        } else {
                            Some(format!(
                                "valuation: relative P/E {rel:.2} (max {:.1}), PEG {p:.2} (max {:.1})",
                                t.max_relative_per, t.max_peg
                            ))
                        }
                    }
                    _ => Some("insufficient data (valuation)".to_string()),
                },
            }
        };

        let verdict = if fail_reason.is_none() {
            FundamentalVerdict::Pass
        } else {
            FundamentalVerdict::Fail
        };

        FundamentalAssessment {
            ticker: ticker.to_string(),
            f_score,
            relative_per,
            peg,
            verdict,
            fail_reason,
            warnings,
        }
    }
}

/// Piotroski F-score: nine binary tests, one point each.
///
/// Returns None unless every input the nine tests need is present.
pub fn f_score(f: &FinancialRecord) -> Option<u8> {
    let roa = f.roa?;
    let roa_prev = f.roa_prev?;
    let ocf = f.operating_cash_flow?;
    let net_income = f.net_income?;
    let debt = f.long_term_debt_ratio?;
    let debt_prev = f.long_term_debt_ratio_prev?;
    let current = f.current_ratio?;
    let current_prev = f.current_ratio_prev?;
    let shares = f.shares_outstanding?;
    let shares_prev = f.shares_outstanding_prev?;
    let margin = f.gross_margin?;
    let margin_prev = f.gross_margin_prev?;
    let turnover = f.asset_turnover?;
    let turnover_prev = f.asset_turnover_prev?;

    let tests = [
        roa > 0.0,
        ocf > 0.0,
        roa > roa_prev,
        ocf > net_income,
        debt < debt_prev,
        current > current_prev,
        shares <= shares_prev,
        margin > margin_prev,
        turnover > turnover_prev,
    ];
    Some(tests.iter().filter(|&&passed| passed).count() as u8)
}

fn within_window(date: NaiveDate, as_of: NaiveDate, window_days: i64) -> bool {
    let age = as_of.signed_duration_since(date).num_days();
    (0..=window_days).contains(&age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DisclosureCategory;

    fn strong_record() -> FinancialRecord {
        FinancialRecord {
            roa: Some(0.08),
            roa_prev: Some(0.06),
            operating_cash_flow: Some(5000.0),
            net_income: Some(4000.0),
            long_term_debt_ratio: Some(0.20),
            long_term_debt_ratio_prev: Some(0.25),
            current_ratio: Some(1.8),
            current_ratio_prev: Some(1.6),
            shares_outstanding: Some(10_000.0),
            shares_outstanding_prev: Some(10_000.0),
            gross_margin: Some(0.35),
            gross_margin_prev: Some(0.32),
            asset_turnover: Some(0.9),
            asset_turnover_prev: Some(0.85),
            per: Some(9.0),
            peg: Some(1.2),
            cb_overhang_pct: Some(0.0),
        }
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn assess(
        record: Option<&FinancialRecord>,
        disclosures: Option<&[Disclosure]>,
        sector_avg_per: Option<f64>,
    ) -> FundamentalAssessment {
        let t = FundamentalThresholds::default();
        FundamentalEvaluator::new(&t).assess("TEST", record, disclosures, sector_avg_per, as_of())
    }

    #[test]
    fn strong_record_scores_nine_and_passes() {
        let record = strong_record();
        assert_eq!(f_score(&record), Some(9));
        let a = assess(Some(&record), Some(&[]), Some(15.0));
        assert_eq!(a.verdict, FundamentalVerdict::Pass);
        assert_eq!(a.f_score, Some(9));
        assert!((a.relative_per.unwrap() - 0.6).abs() < 1e-12);
        assert!(a.fail_reason.is_none());
    }

    #[test]
    fn f_score_requires_every_input() {
        let mut record = strong_record();
        record.gross_margin_prev = None;
        assert_eq!(f_score(&record), None);
        let a = assess(Some(&record), Some(&[]), Some(15.0));
        assert_eq!(a.verdict, FundamentalVerdict::Fail);
        assert_eq!(a.fail_reason.as_deref(), Some("insufficient data"));
    }

    #[test]
    fn missing_record_fails_with_insufficient_data() {
        let a = assess(None, Some(&[]), Some(15.0));
        assert_eq!(a.verdict, FundamentalVerdict::Fail);
        assert_eq!(a.fail_reason.as_deref(), Some("insufficient data"));
    }

    #[test]
    fn low_f_score_is_a_hard_exclude() {
        let mut record = strong_record();
        // Negative ROA and OCF break tests 1-4, worse leverage and
        // liquidity break 5-6: only shares/margin/turnover score.
        record.roa = Some(-0.02);
        record.operating_cash_flow = Some(-100.0);
        record.long_term_debt_ratio = Some(0.30);
        record.current_ratio = Some(1.4);
        assert_eq!(f_score(&record), Some(3));
        let a = assess(Some(&record), Some(&[]), Some(15.0));
        assert_eq!(a.verdict, FundamentalVerdict::Fail);
        assert!(a.fail_reason.unwrap().contains("hard floor"));
    }

    #[test]
    fn expensive_valuation_fails() {
        let mut record = strong_record();
        record.per = Some(20.0); // relative 1.33
        let a = assess(Some(&record), Some(&[]), Some(15.0));
        assert_eq!(a.verdict, FundamentalVerdict::Fail);
        assert!(a.fail_reason.unwrap().starts_with("valuation"));
    }

    #[test]
    fn missing_valuation_inputs_cannot_pass() {
        let record = strong_record();
        let a = assess(Some(&record), Some(&[]), None);
        assert_eq!(a.verdict, FundamentalVerdict::Fail);
        assert_eq!(a.fail_reason.as_deref(), Some("insufficient data (valuation)"));
    }

    #[test]
    fn recent_blacklist_disclosure_overrides_everything() {
        let record = strong_record();
        let disclosures = [Disclosure {
            category: DisclosureCategory::BreachOfDuty,
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        }];
        let a = assess(Some(&record), Some(&disclosures), Some(15.0));
        assert_eq!(a.verdict, FundamentalVerdict::Fail);
        assert!(a.fail_reason.unwrap().contains("breach of duty"));
    }

    #[test]
    fn stale_disclosure_outside_window_is_ignored() {
        let record = strong_record();
        let disclosures = [Disclosure {
            category: DisclosureCategory::InsiderFraud,
            date: NaiveDate::from_ymd_opt(2023, 1, 10).unwrap(),
        }];
        let a = assess(Some(&record), Some(&disclosures), Some(15.0));
        assert_eq!(a.verdict, FundamentalVerdict::Pass);
    }

    #[test]
    fn missing_disclosure_feed_degrades_to_warning() {
        let record = strong_record();
        let a = assess(Some(&record), None, Some(15.0));
        assert_eq!(a.verdict, FundamentalVerdict::Pass);
        assert!(a
            .warnings
            .iter()
            .any(|w| w.contains("disclosure feed unavailable")));
    }

    #[test]
    fn cb_overhang_warns_but_does_not_fail() {
        let mut record = strong_record();
        record.cb_overhang_pct = Some(7.5);
        let a = assess(Some(&record), Some(&[]), Some(15.0));
        assert_eq!(a.verdict, FundamentalVerdict::Pass);
        assert!(a.warnings.iter().any(|w| w.contains("overhang")));
    }
}
