//! Window returns, correlation, and slope helpers.

/// Return over the trailing `sessions` sessions: close[-1] / close[-n] − 1.
///
/// Saturates at the start of the series (matching a shorter history) and
/// returns None for an empty or single-element series.
pub fn window_return(closes: &[f64], sessions: usize) -> Option<f64> {
    if closes.len() < 2 || sessions == 0 {
        return None;
    }
    let last = *closes.last()?;
    let idx = closes.len().saturating_sub(sessions + 1);
    let base = closes[idx];
    if base == 0.0 || last.is_nan() || base.is_nan() {
        return None;
    }
    Some(last / base - 1.0)
}

/// Pearson correlation coefficient of two equal-length series.
///
/// None when the series differ in length, hold fewer than 2 points, or
/// either side has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        if x.is_nan() || y.is_nan() {
            return None;
        }
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Least-squares slope of `values` against index positions 0..n.
///
/// None for fewer than 2 points or any NaN.
pub fn lsq_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = (nf - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / nf;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in values.iter().enumerate() {
        if y.is_nan() {
            return None;
        }
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    Some(num / den)
}
