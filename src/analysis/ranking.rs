//! Ranking Aggregator - composite leadership score per candidate exchange

use serde::Serialize;

use crate::analysis::correlation::LagScan;
use crate::types::ExchangeId;

/// Leadership evidence for one candidate exchange
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadershipResult {
    pub exchange: ExchangeId,
    pub best_correlation: f64,
    pub best_lag: i32,
    pub granger_p_value: f64,
    pub score: f64,
    pub aligned_samples: usize,
}

impl LeadershipResult {
    /// Score = |r| * (1 - p), times `leader_bonus` when the best lag is negative
    pub fn new(
        exchange: ExchangeId,
        scan: LagScan,
        granger_p_value: f64,
        aligned_samples: usize,
        leader_bonus: f64,
    ) -> Self {
        Self {
            exchange,
            best_correlation: scan.correlation,
            best_lag: scan.lag,
            granger_p_value,
            score: composite_score(scan, granger_p_value, leader_bonus),
            aligned_samples,
        }
    }

    pub fn leads_target(&self) -> bool {
        self.best_lag < 0
    }
}

pub fn composite_score(scan: LagScan, granger_p_value: f64, leader_bonus: f64) -> f64 {
    let base = scan.correlation.abs() * (1.0 - granger_p_value);
    if scan.lag < 0 {
        base * leader_bonus
    } else {
        base
    }
}

/// Sort descending by score; equal scores keep their input order.
pub fn rank(mut results: Vec<LeadershipResult>) -> Vec<LeadershipResult> {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results
}
