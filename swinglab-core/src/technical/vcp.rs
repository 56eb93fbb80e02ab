//! Volatility contraction pattern detection.
//!
//! Successive pullbacks from local pivot highs must tighten: three phases
//! with strictly decreasing high-to-low depth, each inside its configured
//! band, and phase volume drying up from one phase to the next. The pivot
//! is the high of the final (tightest) phase; a close through it is the
//! entry trigger.

use crate::config::TechnicalThresholds;
use crate::domain::{Bar, Contraction, VcpPattern};
use crate::indicators::sma;

const VOLUME_MA_WINDOW: usize = 20;

/// Detect the contraction pattern over the trailing window.
pub fn detect(bars: &[Bar], t: &TechnicalThresholds) -> VcpPattern {
    let start = bars.len().saturating_sub(t.vcp_window);
    let recent = &bars[start..];
    let w = t.pivot_window;
    if recent.len() < 2 * w + 1 {
        return VcpPattern::none();
    }

    let volumes: Vec<f64> = recent.iter().map(|b| b.volume as f64).collect();
    let vol_ma = sma(&volumes, VOLUME_MA_WINDOW);

    // Local pivot highs: the maximum of the centered window.
    let mut highs: Vec<(usize, f64)> = Vec::new();
    for i in w..recent.len() - w {
        let h = recent[i].high;
        let window_max = recent[i - w..=i + w]
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        if h == window_max {
            highs.push((i, h));
        }
    }
    if highs.is_empty() {
        return VcpPattern::none();
    }

    // One contraction per pivot high: the pullback from that high until the
    // next high (or the end of the window for the final, still-basing phase).
    let mut contractions = Vec::with_capacity(highs.len());
    for (k, &(h_idx, h_val)) in highs.iter().enumerate() {
        let seg_end = match highs.get(k + 1) {
            Some(&(next_idx, _)) => next_idx + 1,
            None => recent.len(),
        };
        let segment = &recent[h_idx..seg_end];
        let seg_low = segment.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        if h_val <= 0.0 || !seg_low.is_finite() {
            continue;
        }
        let depth_pct = (h_val - seg_low) / h_val * 100.0;

        let seg_vol =
            segment.iter().map(|b| b.volume as f64).sum::<f64>() / segment.len() as f64;
        let baseline = match vol_ma[h_idx] {
            m if m.is_finite() && m > 0.0 => m,
            _ => seg_vol.max(1.0), // warmup gap: neutral ratio
        };
        contractions.push(Contraction {
            depth_pct,
            volume_ratio: seg_vol / baseline,
        });
    }

    let pivot = highs.last().map(|&(_, h)| h).unwrap_or(0.0);
    let tightness = contractions.last().map(|c| c.depth_pct).unwrap_or(0.0);

    if contractions.len() < t.contraction_bands.len() {
        return VcpPattern {
            detected: false,
            contractions,
            pivot,
            tightness_pct: tightness,
        };
    }

    let last3 = &contractions[contractions.len() - t.contraction_bands.len()..];
    let depths_decreasing = last3.windows(2).all(|p| p[0].depth_pct > p[1].depth_pct);
    let volume_dry_up = last3
        .windows(2)
        .all(|p| p[0].volume_ratio > p[1].volume_ratio);
    let in_bands = last3.iter().zip(t.contraction_bands.iter()).all(|(c, b)| {
        let lo = b[0] * (1.0 - t.band_slack);
        let hi = b[1] * (1.0 + t.band_slack);
        c.depth_pct >= lo && c.depth_pct <= hi
    });

    if depths_decreasing && volume_dry_up && in_bands {
        VcpPattern {
            detected: true,
            contractions: last3.to_vec(),
            pivot,
            tightness_pct: last3.last().map(|c| c.depth_pct).unwrap_or(0.0),
        }
    } else {
        VcpPattern {
            detected: false,
            contractions,
            pivot,
            tightness_pct: tightness,
        }
    }
}
