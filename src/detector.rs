//! Price Source Detector - which reference exchange leads the target?
//!
//! One run fetches the target's trades, then each candidate's, strictly in
//! sequence. A failing candidate is recorded and skipped; only a failing
//! target aborts the run.

use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

use crate::analysis::{
    analyze_candidate, rank, resample, AnalysisParams, LeadershipResult, PriceSeries,
};
use crate::config::DetectorConfig;
use crate::error::{DetectError, ExclusionReason};
use crate::oracle::SourceRegistry;
use crate::types::{ExchangeId, TradingPair};

/// Everything one detection run needs
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub target: ExchangeId,
    pub pair: TradingPair,
    /// Candidate identifiers as the user typed them
    pub candidates: Vec<String>,
    pub lookback: Duration,
    pub params: AnalysisParams,
}

impl DetectionRequest {
    pub fn from_config(cfg: &DetectorConfig) -> Result<Self, DetectError> {
        Ok(Self {
            target: cfg.target_exchange.parse()?,
            pair: cfg.symbol.parse()?,
            candidates: cfg.candidates.clone(),
            lookback: Duration::from_secs(cfg.lookback_secs),
            params: cfg.analysis_params(),
        })
    }
}

/// A candidate that produced no score, and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedCandidate {
    pub exchange: String,
    pub reason: ExclusionReason,
}

/// Ranked outcome of a detection run
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub target: ExchangeId,
    pub pair: TradingPair,
    pub window_start_ms: i64,
    pub window_end_ms: i64,
    pub target_samples: usize,
    /// Descending by score
    pub ranked: Vec<LeadershipResult>,
    pub excluded: Vec<ExcludedCandidate>,
}

impl DetectionReport {
    /// Most likely price source, if any candidate could be scored
    pub fn leader(&self) -> Option<&LeadershipResult> {
        self.ranked.first()
    }
}

pub struct PriceSourceDetector<'a> {
    registry: &'a SourceRegistry,
}

impl<'a> PriceSourceDetector<'a> {
    pub fn new(registry: &'a SourceRegistry) -> Self {
        Self { registry }
    }

    /// Run against a window ending now
    pub async fn run(&self, request: &DetectionRequest) -> Result<DetectionReport, DetectError> {
        self.run_at(request, chrono::Utc::now().timestamp_millis())
            .await
    }

    /// Run against the window `[now_ms - lookback, now_ms]`
    pub async fn run_at(
        &self,
        request: &DetectionRequest,
        now_ms: i64,
    ) -> Result<DetectionReport, DetectError> {
        let since_ms = now_ms - request.lookback.as_millis() as i64;
        let params = &request.params;

        info!(
            target_exchange = %request.target,
            pair = %request.pair,
            lookback_secs = request.lookback.as_secs(),
            "🔎 Starting price source detection"
        );

        let target_source = self
            .registry
            .get(request.target)
            .ok_or(DetectError::SourceNotRegistered(request.target))?;

        let unavailable = |reason: String| DetectError::DataUnavailable {
            exchange: request.target.to_string(),
            reason,
        };
        let mut target_trades = target_source
            .fetch_trades(&request.pair, since_ms)
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        target_trades.retain(|t| t.ts <= now_ms);
        let target_series = resample(&target_trades, params.resample_interval_ms)
            .ok_or_else(|| unavailable("no trades in window".to_string()))?;

        let mut ranked = Vec::new();
        let mut excluded = Vec::new();
        let mut seen = HashSet::new();

        for raw in &request.candidates {
            let exchange = match raw.parse::<ExchangeId>() {
                Ok(id) => id,
                Err(_) => {
                    warn!(candidate = %raw, "Unknown candidate exchange");
                    excluded.push(ExcludedCandidate {
                        exchange: raw.clone(),
                        reason: ExclusionReason::UnknownExchange,
                    });
                    continue;
                }
            };
            if exchange == request.target || !seen.insert(exchange) {
                continue;
            }

            match self.evaluate(exchange, request, &target_series, since_ms, now_ms).await {
                Ok(result) => ranked.push(result),
                Err(reason) => {
                    warn!(exchange = %exchange, reason = %reason, "Candidate excluded");
                    excluded.push(ExcludedCandidate {
                        exchange: exchange.to_string(),
                        reason,
                    });
                }
            }
        }

        let ranked = rank(ranked);
        if let Some(leader) = ranked.first() {
            info!(
                leader = %leader.exchange,
                score = leader.score,
                lag = leader.best_lag,
                "🏁 Detection finished"
            );
        } else {
            warn!("No candidate produced a usable score");
        }

        Ok(DetectionReport {
            target: request.target,
            pair: request.pair.clone(),
            window_start_ms: since_ms,
            window_end_ms: now_ms,
            target_samples: target_series.len(),
            ranked,
            excluded,
        })
    }

    async fn evaluate(
        &self,
        exchange: ExchangeId,
        request: &DetectionRequest,
        target_series: &PriceSeries,
        since_ms: i64,
        now_ms: i64,
    ) -> Result<LeadershipResult, ExclusionReason> {
        let source = self
            .registry
            .get(exchange)
            .ok_or_else(|| ExclusionReason::Unavailable {
                message: format!("no market data source registered for {exchange}"),
            })?;

        let mut trades = source
            .fetch_trades(&request.pair, since_ms)
            .await
            .map_err(|e| ExclusionReason::Unavailable {
                message: e.to_string(),
            })?;
        trades.retain(|t| t.ts <= now_ms);

        analyze_candidate(exchange, target_series, &trades, &request.params)
    }
}
