//! Lagged Correlation Scanner
//!
//! Sweeps a symmetric window of integer lags and keeps the one whose Pearson
//! correlation has the largest magnitude.
//!
//! Lag convention (relied on by the ranking bonus):
//! - `L > 0` pairs `target[L..]` with `candidate[..n-L]`
//! - `L < 0` pairs `target[..n-|L|]` with `candidate[|L|..]`

use serde::Serialize;

/// Best lag found by [`scan_lags`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LagScan {
    pub lag: i32,
    pub correlation: f64,
}

impl Default for LagScan {
    fn default() -> Self {
        Self {
            lag: 0,
            correlation: 0.0,
        }
    }
}

/// Pearson correlation coefficient.
///
/// `None` when fewer than two points overlap or either side has no variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Slices compared at a given lag, or `None` if the lag leaves nothing to compare.
fn lagged<'a>(
    target: &'a [f64],
    candidate: &'a [f64],
    lag: i32,
) -> Option<(&'a [f64], &'a [f64])> {
    let n = target.len().min(candidate.len());
    let shift = lag.unsigned_abs() as usize;
    if shift >= n {
        return None;
    }
    let (target, candidate) = (&target[..n], &candidate[..n]);
    Some(if lag > 0 {
        (&target[shift..], &candidate[..n - shift])
    } else if lag < 0 {
        (&target[..n - shift], &candidate[shift..])
    } else {
        (target, candidate)
    })
}

/// Scan lags `-max_lag..=max_lag` and return the strongest correlation.
///
/// Ties keep the earliest lag in ascending order. Lags with no usable
/// correlation are skipped; if none is usable the result is lag 0, r = 0.
pub fn scan_lags(target: &[f64], candidate: &[f64], max_lag: usize) -> LagScan {
    let max_lag = max_lag as i32;
    let mut best: Option<LagScan> = None;

    for lag in -max_lag..=max_lag {
        let Some((t, c)) = lagged(target, candidate, lag) else {
            continue;
        };
        let Some(correlation) = pearson(t, c) else {
            continue;
        };
        if best.map_or(true, |b| correlation.abs() > b.correlation.abs()) {
            best = Some(LagScan { lag, correlation });
        }
    }

    best.unwrap_or_default()
}
