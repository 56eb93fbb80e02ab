//! Volume-profile point of control.
//!
//! Each session's volume is spread across the price bins its high-low range
//! overlaps, proportionally to the overlap. The POC is the midpoint of the
//! bin that accumulated the most volume; ties resolve to the lowest bin.

use crate::domain::Bar;

/// POC over the trailing `window` sessions with `bins` price buckets.
///
/// None for an empty window or when no bar carries usable prices.
pub fn poc(bars: &[Bar], window: usize, bins: usize) -> Option<f64> {
    let start = bars.len().saturating_sub(window);
    let recent = &bars[start..];
    if recent.is_empty() || bins == 0 {
        return None;
    }

    let mut price_min = f64::INFINITY;
    let mut price_max = f64::NEG_INFINITY;
    for bar in recent {
        if bar.is_void() {
            continue;
        }
        price_min = price_min.min(bar.low);
        price_max = price_max.max(bar.high);
    }
    if !price_min.is_finite() || !price_max.is_finite() {
        return None;
    }
    if price_max == price_min {
        return recent.last().map(|b| b.close);
    }

    let bin_width = (price_max - price_min) / bins as f64;
    let mut profile = vec![0.0f64; bins];

    for bar in recent {
        if bar.is_void() {
            continue;
        }
        let vol = bar.volume as f64;
        if bar.high <= bar.low {
            // Zero-range session: all volume lands in one bin.
            let idx = bin_index(bar.close, price_min, bin_width, bins);
            profile[idx] += vol;
            continue;
        }
        let candle_range = bar.high - bar.low;
        for (b, slot) in profile.iter_mut().enumerate() {
            let bin_low = price_min + b as f64 * bin_width;
            let bin_high = bin_low + bin_width;
            let overlap = bin_high.min(bar.high) - bin_low.max(bar.low);
            if overlap > 0.0 {
                *slot += vol * (overlap / candle_range);
            }
        }
    }

    let mut best = 0;
    for (b, &v) in profile.iter().enumerate() {
        if v > profile[best] {
            best = b;
        }
    }
    Some(price_min + (best as f64 + 0.5) * bin_width)
}

fn bin_index(price: f64, price_min: f64, bin_width: f64, bins: usize) -> usize {
    let raw = ((price - price_min) / bin_width).floor() as isize;
    raw.clamp(0, bins as isize - 1) as usize
}
