//! Integration tests for the price source detector and arbitrage tool

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::time::Duration;

    use leadprobe::analysis::AnalysisParams;
    use leadprobe::arbitrage::{ArbitrageQuote, Route};
    use leadprobe::detector::{DetectionRequest, PriceSourceDetector};
    use leadprobe::error::{DetectError, ExclusionReason, SourceError};
    use leadprobe::oracle::{MarketDataSource, SourceRegistry};
    use leadprobe::report;
    use leadprobe::types::{ExchangeId, Trade, TradingPair};

    const NOW: i64 = 1_717_000_180_000;
    const WINDOW_START: i64 = NOW - 180_000;

    /// In-memory source returning a fixed answer
    struct StaticSource {
        id: ExchangeId,
        trades: Option<Vec<Trade>>,
    }

    impl StaticSource {
        fn boxed(id: ExchangeId, trades: Option<Vec<Trade>>) -> Box<dyn MarketDataSource> {
            Box::new(Self { id, trades })
        }
    }

    #[async_trait]
    impl MarketDataSource for StaticSource {
        fn id(&self) -> ExchangeId {
            self.id
        }

        async fn fetch_trades(
            &self,
            pair: &TradingPair,
            since_ms: i64,
        ) -> Result<Vec<Trade>, SourceError> {
            match &self.trades {
                Some(trades) => Ok(trades.iter().copied().filter(|t| t.ts >= since_ms).collect()),
                None => Err(SourceError::SymbolNotFound {
                    exchange: self.id,
                    symbol: pair.to_string(),
                }),
            }
        }
    }

    fn walk(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        let mut price = 65_000.0;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                let step = ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5;
                price *= 1.0 + step * 0.001;
                price
            })
            .collect()
    }

    fn one_per_second(prices: &[f64], start_ms: i64) -> Vec<Trade> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Trade::new(start_ms + i as i64 * 1000, p))
            .collect()
    }

    fn request(candidates: &[&str]) -> DetectionRequest {
        DetectionRequest {
            target: ExchangeId::Mexc,
            pair: TradingPair::new("BTC", "USDT"),
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            lookback: Duration::from_secs(180),
            params: AnalysisParams::default(),
        }
    }

    // ============================================================================
    // Detector
    // ============================================================================

    #[tokio::test]
    async fn test_leading_exchange_ranks_first() {
        let n = 120;
        let base = walk(n + 2, 2024);
        let target = one_per_second(&base[..n], WINDOW_START);
        // target[t] == candidate[t - 2], which the scan reports as lag +2
        let leader = one_per_second(&base[2..n + 2], WINDOW_START);
        let unrelated = one_per_second(&walk(n, 77), WINDOW_START);

        let mut registry = SourceRegistry::new();
        registry.register(StaticSource::boxed(ExchangeId::Mexc, Some(target)));
        registry.register(StaticSource::boxed(ExchangeId::Binance, Some(leader)));
        registry.register(StaticSource::boxed(ExchangeId::Coinbase, Some(unrelated)));

        let report = PriceSourceDetector::new(&registry)
            .run_at(&request(&["coinbase", "binance"]), NOW)
            .await
            .unwrap();

        assert!(report.excluded.is_empty());
        assert_eq!(report.ranked.len(), 2);

        let top = report.leader().unwrap();
        assert_eq!(top.exchange, ExchangeId::Binance);
        assert_eq!(top.best_lag, 2);
        assert!((top.best_correlation - 1.0).abs() < 1e-9);
        assert!(top.granger_p_value < 1e-6);
        assert_eq!(top.aligned_samples, n);
        assert!(report.ranked[0].score >= report.ranked[1].score);
    }

    #[tokio::test]
    async fn test_negative_lag_candidate_gets_bonus() {
        let n = 120;
        let base = walk(n + 2, 99);
        let target = one_per_second(&base[2..n + 2], WINDOW_START);
        // target[t] == candidate[t + 2], which the scan reports as lag -2
        let follower = one_per_second(&base[..n], WINDOW_START);

        let mut registry = SourceRegistry::new();
        registry.register(StaticSource::boxed(ExchangeId::Mexc, Some(target)));
        registry.register(StaticSource::boxed(ExchangeId::Bybit, Some(follower)));

        let report = PriceSourceDetector::new(&registry)
            .run_at(&request(&["bybit"]), NOW)
            .await
            .unwrap();

        let result = report.leader().unwrap();
        assert_eq!(result.best_lag, -2);
        assert!(result.leads_target());
        assert!((result.best_correlation - 1.0).abs() < 1e-9);
        let expected = result.best_correlation.abs() * (1.0 - result.granger_p_value) * 1.2;
        assert!((result.score - expected).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_target_without_trades_fails_the_run() {
        let mut registry = SourceRegistry::new();
        registry.register(StaticSource::boxed(ExchangeId::Mexc, Some(Vec::new())));

        let err = PriceSourceDetector::new(&registry)
            .run_at(&request(&["binance"]), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, DetectError::DataUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_unregistered_target_fails_the_run() {
        let registry = SourceRegistry::new();
        let err = PriceSourceDetector::new(&registry)
            .run_at(&request(&["binance"]), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, DetectError::SourceNotRegistered(ExchangeId::Mexc)));
    }

    #[tokio::test]
    async fn test_candidates_without_usable_data_are_excluded() {
        let prices = walk(100, 5);
        let mut registry = SourceRegistry::new();
        registry.register(StaticSource::boxed(
            ExchangeId::Mexc,
            Some(one_per_second(&prices, WINDOW_START)),
        ));
        // only the last 6 seconds overlap the target
        registry.register(StaticSource::boxed(
            ExchangeId::Binance,
            Some(one_per_second(&prices[..30], WINDOW_START + 94_000)),
        ));
        registry.register(StaticSource::boxed(ExchangeId::Bybit, None));
        // everything older than the window
        registry.register(StaticSource::boxed(
            ExchangeId::Coinbase,
            Some(one_per_second(&prices, WINDOW_START - 500_000)),
        ));

        let report = PriceSourceDetector::new(&registry)
            .run_at(&request(&["binance", "bybit", "coinbase"]), NOW)
            .await
            .unwrap();

        assert!(report.ranked.is_empty());
        assert!(report.leader().is_none());
        assert_eq!(report.excluded.len(), 3);
        assert_eq!(
            report.excluded[0].reason,
            ExclusionReason::InsufficientAlignment {
                aligned: 6,
                required: 10
            }
        );
        assert!(matches!(
            report.excluded[1].reason,
            ExclusionReason::Unavailable { .. }
        ));
        assert_eq!(report.excluded[2].reason, ExclusionReason::NoTrades);

        let text = report::render_detection(&report);
        assert!(text.contains("No candidate exchange produced usable data."));
    }

    #[tokio::test]
    async fn test_trades_after_now_are_ignored() {
        let prices = walk(40, 9);
        let mut registry = SourceRegistry::new();
        registry.register(StaticSource::boxed(
            ExchangeId::Mexc,
            Some(one_per_second(&prices, NOW - 20_000)),
        ));

        let report = PriceSourceDetector::new(&registry)
            .run_at(&request(&[]), NOW)
            .await
            .unwrap();
        // samples at NOW-20s ..= NOW
        assert_eq!(report.target_samples, 21);
    }

    // ============================================================================
    // Arbitrage
    // ============================================================================

    #[test]
    fn test_arbitrage_outcome_serializes() {
        let outcome = ArbitrageQuote {
            venue_a: "KCEX".into(),
            venue_b: "Ourbit".into(),
            buy_a: 100.0,
            sell_a: 101.0,
            buy_b: 99.0,
            sell_b: 102.0,
            fee_percent: 0.1,
        }
        .evaluate()
        .unwrap();

        assert_eq!(outcome.recommendation.unwrap().route, Route::BuyBSellA);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["recommendation"]["route"], "buy_b_sell_a");
        assert_eq!(json["venue_b"], "Ourbit");
    }
}
