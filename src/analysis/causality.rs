//! Causality Scorer - Granger F-test of "candidate helps predict target"
//!
//! For lag order p the restricted model regresses target[t] on a constant
//! and target[t-1..=t-p]; the unrestricted model adds candidate[t-1..=t-p].
//! The SSR-based F statistic is compared against F(p, N - 2p - 1).

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use tracing::trace;

/// Smallest p-value reported, keeps results inside (0, 1]
const MIN_P_VALUE: f64 = f64::MIN_POSITIVE;

/// Smallest-to-largest singular value ratio below which the design is rank deficient
const RANK_TOLERANCE: f64 = 1e-10;

/// Outcome of the F-test at one lag order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrangerLagResult {
    pub lag: usize,
    pub f_statistic: f64,
    pub p_value: f64,
    pub df_num: usize,
    pub df_denom: usize,
}

/// Sum of squared residuals of the least-squares fit `y ~ x`.
///
/// Columns are scaled to unit norm before the SVD so the rank check and the
/// residuals do not depend on the magnitude of the returns.
fn ols_ssr(mut x: DMatrix<f64>, y: &DVector<f64>) -> Option<f64> {
    for mut col in x.column_iter_mut() {
        let norm = col.norm();
        if norm == 0.0 || !norm.is_finite() {
            return None;
        }
        col /= norm;
    }

    let svd = x.clone().svd(true, true);
    let (min_sv, max_sv) = svd
        .singular_values
        .iter()
        .fold((f64::INFINITY, 0.0f64), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !(max_sv > 0.0) || min_sv <= max_sv * RANK_TOLERANCE {
        return None;
    }

    let beta = svd.solve(y, max_sv * RANK_TOLERANCE).ok()?;
    let residuals = y - &x * &beta;
    let ssr = residuals.norm_squared();
    ssr.is_finite().then_some(ssr)
}

/// Design matrix rows for t in lag..n: [1, target lags, (candidate lags)]
fn design(target: &[f64], candidate: &[f64], lag: usize, with_candidate: bool) -> DMatrix<f64> {
    let rows = target.len() - lag;
    let cols = 1 + lag + if with_candidate { lag } else { 0 };
    DMatrix::from_fn(rows, cols, |r, c| {
        let t = r + lag;
        match c {
            0 => 1.0,
            c if c <= lag => target[t - c],
            c => candidate[t - (c - lag)],
        }
    })
}

/// Granger test at a single lag order; `None` if it cannot be computed.
pub fn granger_test(target: &[f64], candidate: &[f64], lag: usize) -> Option<GrangerLagResult> {
    let n = target.len().min(candidate.len());
    if lag == 0 || n <= lag {
        return None;
    }
    let (target, candidate) = (&target[..n], &candidate[..n]);

    let rows = n - lag;
    let params_unrestricted = 2 * lag + 1;
    if rows <= params_unrestricted {
        return None;
    }
    let df_denom = rows - params_unrestricted;

    let y = DVector::from_column_slice(&target[lag..]);
    let ssr_restricted = ols_ssr(design(target, candidate, lag, false), &y)?;
    let ssr_unrestricted = ols_ssr(design(target, candidate, lag, true), &y)?;

    let improvement = (ssr_restricted - ssr_unrestricted).max(0.0);
    let (f_statistic, p_value) = if ssr_unrestricted > 0.0 {
        let f = (improvement / lag as f64) / (ssr_unrestricted / df_denom as f64);
        let dist = FisherSnedecor::new(lag as f64, df_denom as f64).ok()?;
        (f, dist.sf(f))
    } else if improvement > 0.0 {
        // candidate lags explain the target exactly
        (f64::INFINITY, MIN_P_VALUE)
    } else {
        return None;
    };

    if !p_value.is_finite() {
        return None;
    }

    Some(GrangerLagResult {
        lag,
        f_statistic,
        p_value: p_value.clamp(MIN_P_VALUE, 1.0),
        df_num: lag,
        df_denom,
    })
}

/// Run orders 1..=max_lag and keep every order that could be computed.
pub fn granger_tests(target: &[f64], candidate: &[f64], max_lag: usize) -> Vec<GrangerLagResult> {
    (1..=max_lag)
        .filter_map(|lag| {
            let result = granger_test(target, candidate, lag);
            if result.is_none() {
                trace!(lag, "Granger test skipped");
            }
            result
        })
        .collect()
}

/// Minimum p-value across lag orders, or 1.0 when no order could run.
pub fn granger_min_p_value(target: &[f64], candidate: &[f64], max_lag: usize) -> f64 {
    granger_tests(target, candidate, max_lag)
        .iter()
        .map(|r| r.p_value)
        .fold(1.0, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5
            })
            .collect()
    }

    #[test]
    fn test_ols_ssr_exact_line() {
        // y = 1 + 2x fits with zero residual
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let y = DVector::from_column_slice(&[1.0, 3.0, 5.0, 7.0]);
        assert!(ols_ssr(x, &y).unwrap() < 1e-20);
    }

    #[test]
    fn test_ols_ssr_rank_deficient() {
        // second column is twice the first
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        let y = DVector::from_column_slice(&[1.0, 2.0, 4.0]);
        assert!(ols_ssr(x, &y).is_none());
    }

    #[test]
    fn test_matches_reference_ssr_f_test() {
        let target = [
            0.12, 0.23, 0.12, 0.26, -0.36, 0.64, -0.05, -0.15, -0.06, 0.22, -0.18, 0.15, 0.12, 0.05,
        ];
        let candidate = [
            0.50, -0.10, 0.27, -0.31, 0.44, 0.02, -0.38, 0.21, 0.16, -0.25, 0.36, -0.05, 0.12, 0.29,
        ];
        let r = granger_test(&target, &candidate, 2).unwrap();
        assert_eq!((r.df_num, r.df_denom), (2, 7));
        // SSR_r = 0.4724384182186133, SSR_u = 0.10605447741757558
        assert!((r.f_statistic - 12.091368738300146).abs() < 1e-8, "F = {}", r.f_statistic);
        // F(2, 7) survival: (7 / (7 + 2F))^3.5
        assert!((r.p_value - 0.005359734850995412).abs() < 1e-9, "p = {}", r.p_value);
    }

    #[test]
    fn test_result_independent_of_return_scale() {
        let candidate = noise(150, 41);
        let wobble = noise(150, 97);
        let mut target = vec![0.0; 150];
        for t in 1..150 {
            target[t] = 0.9 * candidate[t - 1] + 0.05 * wobble[t];
        }
        let base = granger_tests(&target, &candidate, 3);
        assert_eq!(base.len(), 3);

        for scale in [1e-3, 1e-6, 1e-9] {
            let t: Vec<f64> = target.iter().map(|v| v * scale).collect();
            let c: Vec<f64> = candidate.iter().map(|v| v * scale).collect();
            let scaled = granger_tests(&t, &c, 3);
            assert_eq!(scaled.len(), 3, "orders dropped at scale {scale}");
            for (a, b) in base.iter().zip(&scaled) {
                assert!(
                    (a.f_statistic - b.f_statistic).abs() <= 1e-6 * a.f_statistic,
                    "F drifted at scale {scale}: {} vs {}",
                    a.f_statistic,
                    b.f_statistic
                );
            }
            let p = granger_min_p_value(&t, &c, 3);
            let p_base = granger_min_p_value(&target, &candidate, 3);
            assert!((p - p_base).abs() <= 1e-4 * p_base, "p drifted at scale {scale}");
        }
    }

    #[test]
    fn test_leading_candidate_is_significant() {
        let candidate = noise(150, 41);
        let wobble = noise(150, 97);
        let mut target = vec![0.0; 150];
        for t in 1..150 {
            target[t] = 0.9 * candidate[t - 1] + 0.05 * wobble[t];
        }
        let p = granger_min_p_value(&target, &candidate, 3);
        assert!(p > 0.0);
        assert!(p < 1e-6, "expected strong evidence, got p = {p}");
    }

    #[test]
    fn test_unrelated_series_weaker_than_leader() {
        let candidate = noise(150, 41);
        let unrelated = noise(150, 7);
        let wobble = noise(150, 97);
        let mut target = vec![0.0; 150];
        for t in 1..150 {
            target[t] = 0.9 * candidate[t - 1] + 0.05 * wobble[t];
        }
        let leader_p = granger_min_p_value(&target, &candidate, 3);
        let unrelated_p = granger_min_p_value(&target, &unrelated, 3);
        assert!(unrelated_p > 0.0 && unrelated_p <= 1.0);
        assert!(unrelated_p > leader_p);
    }

    #[test]
    fn test_fails_closed() {
        // too short for lag 1: rows = 3, params = 3
        assert_eq!(granger_min_p_value(&[0.1, 0.2, 0.3, 0.4], &[0.4, 0.3, 0.2, 0.1], 3), 1.0);
        // constant target makes the restricted model singular
        let flat = vec![0.0; 40];
        assert_eq!(granger_min_p_value(&flat, &noise(40, 3), 3), 1.0);
        assert!(granger_tests(&flat, &noise(40, 3), 3).is_empty());
        assert_eq!(granger_min_p_value(&[], &[], 3), 1.0);
    }

    #[test]
    fn test_degrees_of_freedom() {
        let a = noise(60, 1);
        let b = noise(60, 2);
        let r = granger_test(&a, &b, 2).unwrap();
        assert_eq!(r.df_num, 2);
        // rows = 58, params = 5
        assert_eq!(r.df_denom, 53);
        assert!(r.f_statistic >= 0.0);
    }
}
