//! MEXC spot REST client (Binance-compatible v3 API)
//!
//! `/api/v3/trades` has no start time parameter; the most recent trades are
//! returned and the window filter drops anything older.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SourceError;
use crate::oracle::sources::{decode, fetch_first_listed, get, parse_price};
use crate::oracle::MarketDataSource;
use crate::types::{ExchangeId, Trade, TradingPair};

const MEXC_REST_URL: &str = "https://api.mexc.com";
const MAX_TRADES: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
struct MexcTrade {
    price: String,
    time: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiError {
    code: i64,
    #[serde(default)]
    msg: String,
}

impl ApiError {
    fn is_invalid_symbol(&self) -> bool {
        self.code == -1121 || self.msg.to_lowercase().contains("symbol")
    }
}

#[derive(Debug, Clone)]
pub struct MexcClient {
    client: reqwest::Client,
    base_url: String,
}

impl MexcClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, MEXC_REST_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_pair(&self, pair: TradingPair) -> Result<Vec<Trade>, SourceError> {
        let url = format!("{}/api/v3/trades", self.base_url);
        let query = [("symbol", pair.concat()), ("limit", MAX_TRADES.to_string())];

        tracing::debug!(source = %"MEXC", symbol = %pair.concat(), "📥 Fetching recent trades...");
        let response = get(&self.client, &url, &query).await?;

        if !response.is_success() {
            let invalid_symbol = decode::<ApiError>(ExchangeId::Mexc, &response.body)
                .map(|e| e.is_invalid_symbol())
                .unwrap_or(false);
            if invalid_symbol {
                return Err(SourceError::SymbolNotFound {
                    exchange: ExchangeId::Mexc,
                    symbol: pair.concat(),
                });
            }
            return Err(response.api_error(ExchangeId::Mexc));
        }

        parse_trades(&response.body)
    }
}

fn parse_trades(body: &str) -> Result<Vec<Trade>, SourceError> {
    let rows: Vec<MexcTrade> = decode(ExchangeId::Mexc, body)?;
    Ok(rows
        .into_iter()
        .filter_map(|row| Some(Trade::new(row.time, parse_price(&row.price)?)))
        .collect())
}

#[async_trait]
impl MarketDataSource for MexcClient {
    fn id(&self) -> ExchangeId {
        ExchangeId::Mexc
    }

    async fn fetch_trades(
        &self,
        pair: &TradingPair,
        since_ms: i64,
    ) -> Result<Vec<Trade>, SourceError> {
        fetch_first_listed(ExchangeId::Mexc, pair, since_ms, |p| self.fetch_pair(p)).await
    }
}
