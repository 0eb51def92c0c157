//! Market data source implementations (Binance, Bybit, Coinbase, MEXC)
//!
//! All adapters use public, unauthenticated REST endpoints. Request timeouts
//! come from the shared `reqwest::Client`.

mod binance;
mod bybit;
mod coinbase;
mod mexc;

pub use binance::BinanceClient;
pub use bybit::BybitClient;
pub use coinbase::CoinbaseClient;
pub use mexc::MexcClient;

use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::{debug, info};

use crate::error::SourceError;
use crate::types::{ExchangeId, Trade, TradingPair};

/// Status code and body of a GET request
pub(crate) struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Error for an unexpected status, body truncated for logs
    pub fn api_error(&self, exchange: ExchangeId) -> SourceError {
        SourceError::Api {
            exchange,
            status: self.status,
            body: self.body.chars().take(200).collect(),
        }
    }
}

pub(crate) async fn get(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<RawResponse, SourceError> {
    let response = client.get(url).query(query).send().await?;
    let status = response.status().as_u16();
    let body = response.text().await?;
    Ok(RawResponse { status, body })
}

pub(crate) fn decode<T: DeserializeOwned>(exchange: ExchangeId, body: &str) -> Result<T, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::Decode {
        exchange,
        msg: e.to_string(),
    })
}

/// Parse a decimal string price, skipping rows an exchange sends malformed
pub(crate) fn parse_price(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|p| p.is_finite() && *p > 0.0)
}

/// Try each equivalent spelling of `pair` until the venue recognises one.
///
/// Returned trades are filtered to `since_ms` and sorted oldest first.
pub(crate) async fn fetch_first_listed<F, Fut>(
    exchange: ExchangeId,
    pair: &TradingPair,
    since_ms: i64,
    mut fetch: F,
) -> Result<Vec<Trade>, SourceError>
where
    F: FnMut(TradingPair) -> Fut,
    Fut: Future<Output = Result<Vec<Trade>, SourceError>>,
{
    for candidate in pair.equivalents() {
        match fetch(candidate.clone()).await {
            Err(SourceError::SymbolNotFound { .. }) => {
                debug!(exchange = %exchange, symbol = %candidate, "Symbol not listed, trying next spelling");
            }
            Ok(mut trades) => {
                trades.retain(|t| t.ts >= since_ms);
                trades.sort_by_key(|t| t.ts);
                info!(
                    exchange = %exchange,
                    symbol = %candidate,
                    count = trades.len(),
                    "✅ Trades fetched"
                );
                return Ok(trades);
            }
            Err(e) => return Err(e),
        }
    }

    Err(SourceError::SymbolNotFound {
        exchange,
        symbol: pair.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fallback_to_equivalent_pair() {
        let pair = TradingPair::new("BTC", "USDT");
        let mut tried = Vec::new();
        let trades = fetch_first_listed(ExchangeId::Coinbase, &pair, 2, |p| {
            tried.push(p.clone());
            async move {
                if p.quote == "USD" {
                    Ok(vec![Trade::new(3, 10.0), Trade::new(1, 9.0), Trade::new(2, 9.5)])
                } else {
                    Err(SourceError::SymbolNotFound {
                        exchange: ExchangeId::Coinbase,
                        symbol: p.to_string(),
                    })
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(tried.len(), 2);
        assert_eq!(trades, vec![Trade::new(2, 9.5), Trade::new(3, 10.0)]);
    }

    #[tokio::test]
    async fn test_all_spellings_missing() {
        let pair = TradingPair::new("FOO", "USDT");
        let err = fetch_first_listed(ExchangeId::Binance, &pair, 0, |p| async move {
            Err(SourceError::SymbolNotFound {
                exchange: ExchangeId::Binance,
                symbol: p.to_string(),
            })
        })
        .await
        .unwrap_err();
        assert!(matches!(err, SourceError::SymbolNotFound { symbol, .. } if symbol == "FOO/USDT"));
    }

    #[test]
    fn test_other_errors_stop_fallback() {
        let pair = TradingPair::new("BTC", "USDT");
        let mut calls = 0;
        let result = tokio_test::block_on(fetch_first_listed(ExchangeId::Mexc, &pair, 0, |_| {
            calls += 1;
            async move {
                Err(SourceError::Decode {
                    exchange: ExchangeId::Mexc,
                    msg: "bad json".into(),
                })
            }
        }));
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(SourceError::Decode { .. })));
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("101.5"), Some(101.5));
        assert_eq!(parse_price("0"), None);
        assert_eq!(parse_price("abc"), None);
    }
}
