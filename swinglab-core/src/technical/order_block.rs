//! Order-block detection.
//!
//! An impulse session is a close-to-close gain above the impulse floor on
//! volume above the configured multiple of its 20-day average, closing
//! through the prior swing high. The order block is the body range of the
//! last bearish candle within the few bars immediately before the impulse.

use crate::config::TechnicalThresholds;
use crate::domain::{Bar, OrderBlock};
use crate::indicators::sma;

const VOLUME_MA_WINDOW: usize = 20;

/// Scan the trailing window for bullish order blocks, oldest first.
pub fn detect(bars: &[Bar], t: &TechnicalThresholds) -> Vec<OrderBlock> {
    let n = bars.len();
    let mut blocks = Vec::new();
    if n < 2 {
        return blocks;
    }

    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
    let vol_ma = sma(&volumes, VOLUME_MA_WINDOW);

    let start = n.saturating_sub(t.order_block_scan).max(1);
    for i in start..n {
        let prev_close = bars[i - 1].close;
        if prev_close <= 0.0 {
            continue;
        }
        let change_pct = (bars[i].close / prev_close - 1.0) * 100.0;
        if change_pct <= t.impulse_min_change_pct {
            continue;
        }

        let vol_ratio = match vol_ma[i] {
            m if m.is_finite() && m > 0.0 => bars[i].volume as f64 / m,
            _ => 0.0,
        };
        if vol_ratio <= t.impulse_volume_ratio {
            continue;
        }

        // Break of structure: the impulse must close through the swing
        // high of the preceding bars.
        let swing_start = i.saturating_sub(t.swing_lookback);
        let swing_high = bars[swing_start..i]
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        if bars[i].close <= swing_high {
            continue;
        }

        // Last bearish candle immediately before the impulse.
        let floor = i.saturating_sub(t.last_bearish_within);
        for j in (floor..i).rev() {
            let candle = &bars[j];
            if candle.is_bearish() {
                blocks.push(OrderBlock {
                    top: candle.open,
                    bottom: candle.close,
                    date: candle.date,
                    impulse_pct: change_pct,
                    volume_ratio: vol_ratio,
                });
                break;
            }
        }
    }

    blocks
}
