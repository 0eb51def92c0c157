//! Bybit V5 public REST client for recent spot trades
//!
//! Bybit always answers HTTP 200; failures are signalled through `retCode`.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SourceError;
use crate::oracle::sources::{decode, fetch_first_listed, get, parse_price};
use crate::oracle::MarketDataSource;
use crate::types::{ExchangeId, Trade, TradingPair};

const BYBIT_REST_URL: &str = "https://api.bybit.com";
/// Spot category caps the recent-trade endpoint at 60 rows
const MAX_TRADES: usize = 60;

/// retCode for "params error" which covers unknown symbols
const PARAMS_ERROR_CODE: i64 = 10001;

#[derive(Debug, Clone, Deserialize)]
struct BybitResponse {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg")]
    ret_msg: String,
    result: Option<BybitResult>,
}

#[derive(Debug, Clone, Deserialize)]
struct BybitResult {
    #[serde(default)]
    list: Vec<BybitTrade>,
}

#[derive(Debug, Clone, Deserialize)]
struct BybitTrade {
    price: String,
    /// Epoch ms as a string
    time: String,
}

#[derive(Debug, Clone)]
pub struct BybitClient {
    client: reqwest::Client,
    base_url: String,
}

impl BybitClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, BYBIT_REST_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_pair(&self, pair: TradingPair) -> Result<Vec<Trade>, SourceError> {
        let url = format!("{}/v5/market/recent-trade", self.base_url);
        let query = [
            ("category", "spot".to_string()),
            ("symbol", pair.concat()),
            ("limit", MAX_TRADES.to_string()),
        ];

        tracing::debug!(source = %"Bybit", symbol = %pair.concat(), "📥 Fetching recent trades...");
        let response = get(&self.client, &url, &query).await?;
        if !response.is_success() {
            return Err(response.api_error(ExchangeId::Bybit));
        }

        parse_response(&response.body, &pair)
    }
}

fn parse_response(body: &str, pair: &TradingPair) -> Result<Vec<Trade>, SourceError> {
    let parsed: BybitResponse = decode(ExchangeId::Bybit, body)?;

    if parsed.ret_code != 0 {
        let msg = parsed.ret_msg.to_lowercase();
        if parsed.ret_code == PARAMS_ERROR_CODE || msg.contains("symbol") {
            return Err(SourceError::SymbolNotFound {
                exchange: ExchangeId::Bybit,
                symbol: pair.concat(),
            });
        }
        return Err(SourceError::Api {
            exchange: ExchangeId::Bybit,
            status: 200,
            body: format!("retCode {}: {}", parsed.ret_code, parsed.ret_msg),
        });
    }

    let rows = parsed.result.map(|r| r.list).unwrap_or_default();
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let ts = row.time.parse::<i64>().ok()?;
            Some(Trade::new(ts, parse_price(&row.price)?))
        })
        .collect())
}

#[async_trait]
impl MarketDataSource for BybitClient {
    fn id(&self) -> ExchangeId {
        ExchangeId::Bybit
    }

    async fn fetch_trades(
        &self,
        pair: &TradingPair,
        since_ms: i64,
    ) -> Result<Vec<Trade>, SourceError> {
        fetch_first_listed(ExchangeId::Bybit, pair, since_ms, |p| self.fetch_pair(p)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> TradingPair {
        TradingPair::new("BTC", "USDT")
    }

    #[test]
    fn test_parse_recent_trades() {
        let body = r#"{
            "retCode":0,"retMsg":"OK",
            "result":{"category":"spot","list":[
                {"execId":"2100000000007764263","symbol":"BTCUSDT","price":"16618.49","size":"0.00012","side":"Buy","time":"1672052955758","isBlockTrade":false},
                {"execId":"2100000000007764262","symbol":"BTCUSDT","price":"16618.00","size":"0.5","side":"Sell","time":"1672052955001","isBlockTrade":false}
            ]},
            "retExtInfo":{},"time":1672053054358
        }"#;
        let trades = parse_response(body, &pair()).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0], Trade::new(1672052955758, 16618.49));
    }

    #[test]
    fn test_unknown_symbol() {
        let body = r#"{"retCode":10001,"retMsg":"Not supported symbols","result":{},"retExtInfo":{},"time":1}"#;
        assert!(matches!(
            parse_response(body, &pair()),
            Err(SourceError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn test_other_ret_code_is_api_error() {
        let body = r#"{"retCode":10006,"retMsg":"Too many visits!","result":null,"time":1}"#;
        assert!(matches!(
            parse_response(body, &pair()),
            Err(SourceError::Api { status: 200, .. })
        ));
    }
}
