//! Analysis core - price-source leadership scoring
//!
//! Pure functions only: trades in, [`LeadershipResult`] out. Fetching and
//! rendering live in `oracle` and `report`.

pub mod causality;
pub mod correlation;
pub mod normalizer;
pub mod ranking;

pub use causality::{granger_min_p_value, granger_test, GrangerLagResult};
pub use correlation::{pearson, scan_lags, LagScan};
pub use normalizer::{align, log_returns, resample, AlignedPair, InsufficientAlignment, PriceSeries};
pub use ranking::{composite_score, rank, LeadershipResult};

use tracing::debug;

use crate::error::ExclusionReason;
use crate::types::{ExchangeId, Trade};

/// Tunables for one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams {
    pub resample_interval_ms: i64,
    pub max_correlation_lag: usize,
    pub granger_max_lag: usize,
    pub leader_bonus: f64,
    pub min_aligned_samples: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            resample_interval_ms: 1000,
            max_correlation_lag: 5,
            granger_max_lag: 3,
            leader_bonus: 1.2,
            min_aligned_samples: 10,
        }
    }
}

/// Score an already aligned pair of price series.
pub fn score_aligned(
    exchange: ExchangeId,
    pair: &AlignedPair,
    params: &AnalysisParams,
) -> LeadershipResult {
    let target_returns = log_returns(&pair.target);
    let candidate_returns = log_returns(&pair.candidate);

    let scan = scan_lags(&target_returns, &candidate_returns, params.max_correlation_lag);
    let p_value = granger_min_p_value(&target_returns, &candidate_returns, params.granger_max_lag);

    debug!(
        exchange = %exchange,
        lag = scan.lag,
        correlation = scan.correlation,
        p_value,
        aligned = pair.len(),
        "Candidate scored"
    );

    LeadershipResult::new(exchange, scan, p_value, pair.len(), params.leader_bonus)
}

/// Resample a candidate's trades, align against the target and score.
pub fn analyze_candidate(
    exchange: ExchangeId,
    target: &PriceSeries,
    candidate_trades: &[Trade],
    params: &AnalysisParams,
) -> Result<LeadershipResult, ExclusionReason> {
    let candidate = resample(candidate_trades, params.resample_interval_ms)
        .ok_or(ExclusionReason::NoTrades)?;

    let pair = align(target, &candidate, params.min_aligned_samples).map_err(|e| {
        ExclusionReason::InsufficientAlignment {
            aligned: e.aligned,
            required: e.required,
        }
    })?;

    Ok(score_aligned(exchange, &pair, params))
}
