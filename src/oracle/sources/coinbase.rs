//! Coinbase Exchange REST client for recent product trades
//!
//! Coinbase lists most books against USD, so USDT requests usually resolve
//! through the pair's USD equivalent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::SourceError;
use crate::oracle::sources::{decode, fetch_first_listed, get, parse_price};
use crate::oracle::MarketDataSource;
use crate::types::{ExchangeId, Trade, TradingPair};

const COINBASE_REST_URL: &str = "https://api.exchange.coinbase.com";
const MAX_TRADES: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
struct CoinbaseTrade {
    time: DateTime<Utc>,
    price: String,
}

#[derive(Debug, Clone)]
pub struct CoinbaseClient {
    client: reqwest::Client,
    base_url: String,
}

impl CoinbaseClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, COINBASE_REST_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_pair(&self, pair: TradingPair) -> Result<Vec<Trade>, SourceError> {
        let url = format!("{}/products/{}/trades", self.base_url, pair.dashed());
        let query = [("limit", MAX_TRADES.to_string())];

        tracing::debug!(source = %"Coinbase", product = %pair.dashed(), "📥 Fetching recent trades...");
        let response = get(&self.client, &url, &query).await?;

        // Unknown products come back as 404 {"message":"NotFound"}
        if response.status == 404 {
            return Err(SourceError::SymbolNotFound {
                exchange: ExchangeId::Coinbase,
                symbol: pair.dashed(),
            });
        }
        if !response.is_success() {
            return Err(response.api_error(ExchangeId::Coinbase));
        }

        parse_trades(&response.body)
    }
}

fn parse_trades(body: &str) -> Result<Vec<Trade>, SourceError> {
    let rows: Vec<CoinbaseTrade> = decode(ExchangeId::Coinbase, body)?;
    Ok(rows
        .into_iter()
        .filter_map(|row| Some(Trade::new(row.time.timestamp_millis(), parse_price(&row.price)?)))
        .collect())
}

#[async_trait]
impl MarketDataSource for CoinbaseClient {
    fn id(&self) -> ExchangeId {
        ExchangeId::Coinbase
    }

    async fn fetch_trades(
        &self,
        pair: &TradingPair,
        since_ms: i64,
    ) -> Result<Vec<Trade>, SourceError> {
        fetch_first_listed(ExchangeId::Coinbase, pair, since_ms, |p| self.fetch_pair(p)).await
    }
}
