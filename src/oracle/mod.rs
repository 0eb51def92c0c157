//! Oracle module - point-in-time trade history from exchange REST APIs
//!
//! One [`MarketDataSource`] adapter per exchange, looked up by
//! [`ExchangeId`] through a [`SourceRegistry`].

pub mod sources;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;

use crate::config::HttpConfig;
use crate::error::SourceError;
use crate::types::{ExchangeId, Trade, TradingPair};

pub use sources::{BinanceClient, BybitClient, CoinbaseClient, MexcClient};

/// Capability to fetch recent trades for a pair
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Exchange this adapter talks to
    fn id(&self) -> ExchangeId;

    /// Trades at or after `since_ms`, oldest first.
    ///
    /// Equivalent spellings of the pair are tried before giving up with
    /// [`SourceError::SymbolNotFound`].
    async fn fetch_trades(
        &self,
        pair: &TradingPair,
        since_ms: i64,
    ) -> Result<Vec<Trade>, SourceError>;
}

/// Lookup table of market-data adapters keyed by exchange
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<ExchangeId, Box<dyn MarketDataSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in adapter sharing one HTTP client
    pub fn with_default_sources(http: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(http.timeout())
            .user_agent(http.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        let mut registry = Self::new();
        registry.register(Box::new(BinanceClient::new(client.clone())));
        registry.register(Box::new(BybitClient::new(client.clone())));
        registry.register(Box::new(CoinbaseClient::new(client.clone())));
        registry.register(Box::new(MexcClient::new(client)));
        Ok(registry)
    }

    /// Add or replace the adapter for `source.id()`
    pub fn register(&mut self, source: Box<dyn MarketDataSource>) {
        self.sources.insert(source.id(), source);
    }

    pub fn get(&self, id: ExchangeId) -> Option<&dyn MarketDataSource> {
        self.sources.get(&id).map(|s| s.as_ref())
    }

    pub fn contains(&self, id: ExchangeId) -> bool {
        self.sources.contains_key(&id)
    }

    /// Registered exchanges in a stable order
    pub fn ids(&self) -> Vec<ExchangeId> {
        let mut ids: Vec<ExchangeId> = self.sources.keys().copied().collect();
        ids.sort();
        ids
    }
}
