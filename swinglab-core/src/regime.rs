//! Regime gate — go/no-go decision from the macro snapshot.
//!
//! Three rules, applied in order:
//! 1. Volatility hard stop: vol index up more than the spike ratio while
//!    the index sits under its 20-day average → CRASH, multiplier 0.
//! 2. Breadth bands: oversold is a contrarian full-size BULL; the middle
//!    band is NORMAL with the multiplier deferred to setup quality;
//!    overbought is BEAR with multiplier 0.
//! 3. FX decoupling: a positive FX/index correlation (inverted from the
//!    historical norm) halves whatever multiplier survives.

use thiserror::Error;

use crate::config::RegimeThresholds;
use crate::domain::{MarketRegime, MarketSnapshot, RegimeDecision};

/// Fatal precondition violation: the pipeline cannot proceed without a
/// complete snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegimeError {
    #[error("market snapshot field '{0}' is missing or non-finite")]
    NonFiniteField(&'static str),
}

pub struct RegimeGate<'a> {
    thresholds: &'a RegimeThresholds,
}

impl<'a> RegimeGate<'a> {
    pub fn new(thresholds: &'a RegimeThresholds) -> Self {
        Self { thresholds }
    }

    pub fn evaluate(&self, snapshot: &MarketSnapshot) -> Result<RegimeDecision, RegimeError> {
        validate(snapshot)?;
        let t = self.thresholds;

        let mut reasons: Vec<String> = Vec::new();

        // Volatility hard stop short-circuits everything else.
        let vol_spiked = snapshot.vol_index > snapshot.vol_index_prev * t.vol_spike_ratio;
        let index_below_ma = snapshot.index_level < snapshot.index_ma20;
        if vol_spiked && index_below_ma {
            reasons.push(format!(
                "vol index spike ({:.1} > {:.1}x{:.2}) with index below 20-day MA: hard stop",
                snapshot.vol_index, snapshot.vol_index_prev, t.vol_spike_ratio
            ));
            return Ok(decision(snapshot, MarketRegime::Crash, 0.0, reasons));
        }

        let breadth = snapshot.breadth_ratio;
        let (regime, mut multiplier) = if breadth < t.oversold_breadth {
            reasons.push(format!(
                "breadth {:.1} < {:.0}: oversold, contrarian full size",
                breadth, t.oversold_breadth
            ));
            (MarketRegime::Bull, 1.0)
        } else if breadth > t.overbought_breadth {
            reasons.push(format!(
                "breadth {:.1} > {:.0}: overbought, no new entries",
                breadth, t.overbought_breadth
            ));
            (MarketRegime::Bear, 0.0)
        } else {
            reasons.push(format!(
                "breadth {:.1}: normal band, size deferred to setup quality",
                breadth
            ));
            (MarketRegime::Normal, 1.0)
        };

        if snapshot.fx_index_corr > t.decoupling_corr {
            reasons.push(format!(
                "FX/index correlation {:.2} > {:.1}: decoupling, size x{:.1}",
                snapshot.fx_index_corr, t.decoupling_corr, t.decoupling_multiplier
            ));
            multiplier *= t.decoupling_multiplier;
        }

        Ok(decision(snapshot, regime, multiplier, reasons))
    }
}

fn decision(
    snapshot: &MarketSnapshot,
    regime: MarketRegime,
    bet_multiplier: f64,
    reasons: Vec<String>,
) -> RegimeDecision {
    RegimeDecision {
        regime,
        bet_multiplier,
        breadth_ratio: snapshot.breadth_ratio,
        vol_index: snapshot.vol_index,
        fx_index_corr: snapshot.fx_index_corr,
        reason: reasons.join(" | "),
    }
}

fn validate(snapshot: &MarketSnapshot) -> Result<(), RegimeError> {
    let fields = [
        ("breadth_ratio", snapshot.breadth_ratio),
        ("vol_index", snapshot.vol_index),
        ("vol_index_prev", snapshot.vol_index_prev),
        ("index_level", snapshot.index_level),
        ("index_ma20", snapshot.index_ma20),
        ("fx_index_corr", snapshot.fx_index_corr),
    ];
    for (name, value) in fields {
        if !value.is_finite() {
            return Err(RegimeError::NonFiniteField(name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshot(breadth: f64) -> MarketSnapshot {
        MarketSnapshot {
            as_of: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            breadth_ratio: breadth,
            vol_index: 18.0,
            vol_index_prev: 18.0,
            index_level: 2700.0,
            index_ma20: 2650.0,
            fx_index_corr: 0.0,
        }
    }

    fn gate_eval(snap: &MarketSnapshot) -> RegimeDecision {
        let t = RegimeThresholds::default();
        RegimeGate::new(&t).evaluate(snap).unwrap()
    }

    #[test]
    fn oversold_is_full_size_bull() {
        let d = gate_eval(&snapshot(60.0));
        assert_eq!(d.regime, MarketRegime::Bull);
        assert_eq!(d.bet_multiplier, 1.0);
        assert!(d.is_tradable());
    }

    #[test]
    fn normal_band_passes_through_full_size() {
        for breadth in [75.0, 100.0, 120.0] {
            let d = gate_eval(&snapshot(breadth));
            assert_eq!(d.regime, MarketRegime::Normal, "breadth {breadth}");
            assert_eq!(d.bet_multiplier, 1.0);
        }
    }

    #[test]
    fn overbought_is_terminal_bear() {
        let d = gate_eval(&snapshot(121.0));
        assert_eq!(d.regime, MarketRegime::Bear);
        assert_eq!(d.bet_multiplier, 0.0);
        assert!(!d.is_tradable());
    }

    #[test]
    fn vol_spike_below_ma_is_crash() {
        let mut snap = snapshot(100.0);
        snap.vol_index_prev = 20.0;
        snap.vol_index = 22.0; // 1.10x > 1.05x
        snap.index_level = 2600.0;
        snap.index_ma20 = 2650.0;
        let d = gate_eval(&snap);
        assert_eq!(d.regime, MarketRegime::Crash);
        assert_eq!(d.bet_multiplier, 0.0);
        assert!(!d.is_tradable());
        assert!(d.reason.contains("hard stop"));
    }

    #[test]
    fn vol_spike_above_ma_is_not_crash() {
        let mut snap = snapshot(100.0);
        snap.vol_index_prev = 20.0;
        snap.vol_index = 22.0;
        // index above its MA: no hard stop
        let d = gate_eval(&snap);
        assert_eq!(d.regime, MarketRegime::Normal);
    }

    #[test]
    fn decoupling_halves_multiplier() {
        let mut snap = snapshot(100.0);
        snap.fx_index_corr = 0.35;
        let d = gate_eval(&snap);
        assert_eq!(d.regime, MarketRegime::Normal);
        assert_eq!(d.bet_multiplier, 0.5);
        assert!(d.reason.contains("decoupling"));
    }

    #[test]
    fn decoupling_applies_multiplicatively_to_oversold() {
        let mut snap = snapshot(60.0);
        snap.fx_index_corr = 0.35;
        let d = gate_eval(&snap);
        assert_eq!(d.regime, MarketRegime::Bull);
        assert_eq!(d.bet_multiplier, 0.5);
    }

    #[test]
    fn nan_field_is_fatal() {
        let mut snap = snapshot(100.0);
        snap.index_ma20 = f64::NAN;
        let t = RegimeThresholds::default();
        let err = RegimeGate::new(&t).evaluate(&snap).unwrap_err();
        assert_eq!(err, RegimeError::NonFiniteField("index_ma20"));
    }
}
