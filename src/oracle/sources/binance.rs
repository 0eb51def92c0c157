//! Binance spot REST client for recent aggregated trades

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SourceError;
use crate::oracle::sources::{decode, fetch_first_listed, get, parse_price};
use crate::oracle::MarketDataSource;
use crate::types::{ExchangeId, Trade, TradingPair};

const BINANCE_REST_URL: &str = "https://api.binance.com";
const MAX_TRADES: usize = 1000;

/// Binance answers an unknown symbol with HTTP 400 and this code
const INVALID_SYMBOL_CODE: i64 = -1121;

#[derive(Debug, Clone, Deserialize)]
struct AggTrade {
    #[serde(rename = "p")]
    price: String,
    #[serde(rename = "T")]
    ts: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiError {
    code: i64,
}

#[derive(Debug, Clone)]
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, BINANCE_REST_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_pair(&self, pair: TradingPair, since_ms: i64) -> Result<Vec<Trade>, SourceError> {
        let url = format!("{}/api/v3/aggTrades", self.base_url);
        let query = [
            ("symbol", pair.concat()),
            ("startTime", since_ms.to_string()),
            ("limit", MAX_TRADES.to_string()),
        ];

        tracing::debug!(source = %"Binance", symbol = %pair.concat(), "📥 Fetching aggregated trades...");
        let response = get(&self.client, &url, &query).await?;

        if !response.is_success() {
            let invalid_symbol = decode::<ApiError>(ExchangeId::Binance, &response.body)
                .map(|e| e.code == INVALID_SYMBOL_CODE)
                .unwrap_or(false);
            if response.status == 400 && invalid_symbol {
                return Err(SourceError::SymbolNotFound {
                    exchange: ExchangeId::Binance,
                    symbol: pair.concat(),
                });
            }
            return Err(response.api_error(ExchangeId::Binance));
        }

        parse_trades(&response.body)
    }
}

fn parse_trades(body: &str) -> Result<Vec<Trade>, SourceError> {
    let rows: Vec<AggTrade> = decode(ExchangeId::Binance, body)?;
    Ok(rows
        .into_iter()
        .filter_map(|row| Some(Trade::new(row.ts, parse_price(&row.price)?)))
        .collect())
}

#[async_trait]
impl MarketDataSource for BinanceClient {
    fn id(&self) -> ExchangeId {
        ExchangeId::Binance
    }

    async fn fetch_trades(
        &self,
        pair: &TradingPair,
        since_ms: i64,
    ) -> Result<Vec<Trade>, SourceError> {
        fetch_first_listed(ExchangeId::Binance, pair, since_ms, |p| {
            self.fetch_pair(p, since_ms)
        })
        .await
    }
}
