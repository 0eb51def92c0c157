//! Price Series Normalizer - irregular trade streams onto a uniform time grid
//!
//! Each sample holds the last price traded at or before its instant. The grid
//! starts at the first trade (rounded up to the interval) so nothing is
//! invented before the market actually printed.

use serde::Serialize;
use tracing::debug;

use crate::types::Trade;

/// Evenly spaced, forward-filled price series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    /// Timestamp of the first sample (epoch ms, multiple of `interval_ms`)
    pub start_ms: i64,
    pub interval_ms: i64,
    pub prices: Vec<f64>,
}

impl PriceSeries {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Timestamp of sample `i`
    pub fn timestamp(&self, i: usize) -> i64 {
        self.start_ms + i as i64 * self.interval_ms
    }

    /// Timestamp of the last sample
    pub fn end_ms(&self) -> i64 {
        self.timestamp(self.prices.len().saturating_sub(1))
    }
}

/// Target and candidate prices over their common time range
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub start_ms: i64,
    pub interval_ms: i64,
    pub target: Vec<f64>,
    pub candidate: Vec<f64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

/// Overlap between two series was too short to analyse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientAlignment {
    pub aligned: usize,
    pub required: usize,
}

fn ceil_to(ts: i64, interval_ms: i64) -> i64 {
    ts.div_euclid(interval_ms) * interval_ms
        + if ts.rem_euclid(interval_ms) == 0 { 0 } else { interval_ms }
}

/// Resample trades to a fixed interval with forward fill.
///
/// Returns `None` when no trade has a usable price or the interval is not
/// positive.
pub fn resample(trades: &[Trade], interval_ms: i64) -> Option<PriceSeries> {
    if interval_ms <= 0 {
        return None;
    }

    let mut valid: Vec<Trade> = trades.iter().copied().filter(Trade::is_valid).collect();
    if valid.len() < trades.len() {
        debug!(
            dropped = trades.len() - valid.len(),
            "Dropped trades with unusable prices"
        );
    }
    if valid.is_empty() {
        return None;
    }
    valid.sort_by_key(|t| t.ts);

    let start_ms = ceil_to(valid[0].ts, interval_ms);
    let end_ms = ceil_to(valid[valid.len() - 1].ts, interval_ms);
    let samples = ((end_ms - start_ms) / interval_ms) as usize + 1;

    let mut prices = Vec::with_capacity(samples);
    let mut cursor = 0usize;
    let mut last = valid[0].price;
    for i in 0..samples {
        let instant = start_ms + i as i64 * interval_ms;
        while cursor < valid.len() && valid[cursor].ts <= instant {
            last = valid[cursor].price;
            cursor += 1;
        }
        prices.push(last);
    }

    Some(PriceSeries {
        start_ms,
        interval_ms,
        prices,
    })
}

/// Intersect two series on their shared timestamps.
pub fn align(
    target: &PriceSeries,
    candidate: &PriceSeries,
    min_samples: usize,
) -> Result<AlignedPair, InsufficientAlignment> {
    let insufficient = |aligned| InsufficientAlignment {
        aligned,
        required: min_samples,
    };

    if target.interval_ms != candidate.interval_ms
        || target.is_empty()
        || candidate.is_empty()
    {
        return Err(insufficient(0));
    }
    let interval = target.interval_ms;

    let start = target.start_ms.max(candidate.start_ms);
    let end = target.end_ms().min(candidate.end_ms());
    if end < start {
        return Err(insufficient(0));
    }

    let count = ((end - start) / interval) as usize + 1;
    if count < min_samples {
        return Err(insufficient(count));
    }

    let t_off = ((start - target.start_ms) / interval) as usize;
    let c_off = ((start - candidate.start_ms) / interval) as usize;

    Ok(AlignedPair {
        start_ms: start,
        interval_ms: interval,
        target: target.prices[t_off..t_off + count].to_vec(),
        candidate: candidate.prices[c_off..c_off + count].to_vec(),
    })
}

/// Log returns between consecutive prices; one element shorter than the input.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect()
}
