//! Core types used throughout LeadProbe
//!
//! Defines exchanges, trading pairs and the raw trade record shared by the
//! market-data sources and the analysis core.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DetectError;

/// Supported exchanges with a public trades endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    Binance,
    Bybit,
    Coinbase,
    Mexc,
}

impl ExchangeId {
    pub const ALL: [ExchangeId; 4] = [
        ExchangeId::Binance,
        ExchangeId::Bybit,
        ExchangeId::Coinbase,
        ExchangeId::Mexc,
    ];

    /// Lowercase identifier used in config and CLI flags
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Binance => "binance",
            ExchangeId::Bybit => "bybit",
            ExchangeId::Coinbase => "coinbase",
            ExchangeId::Mexc => "mexc",
        }
    }
}

impl FromStr for ExchangeId {
    type Err = DetectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Ok(ExchangeId::Binance),
            "bybit" => Ok(ExchangeId::Bybit),
            "coinbase" | "coinbase-exchange" | "gdax" => Ok(ExchangeId::Coinbase),
            "mexc" | "mxc" => Ok(ExchangeId::Mexc),
            other => Err(DetectError::UnknownExchange(other.to_string())),
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quote assets recognised when splitting a concatenated symbol like `BTCUSDT`.
/// Longer suffixes first so `USDT` wins over `USD`.
const KNOWN_QUOTES: [&str; 7] = ["USDT", "USDC", "FDUSD", "USD", "EUR", "BTC", "ETH"];

/// A spot trading pair, independent of any exchange's spelling
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    pub base: String,
    pub quote: String,
}

impl TradingPair {
    pub fn new(base: &str, quote: &str) -> Self {
        Self {
            base: base.trim().to_uppercase(),
            quote: quote.trim().to_uppercase(),
        }
    }

    /// Concatenated form used by Binance, Bybit and MEXC (e.g. `BTCUSDT`)
    pub fn concat(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }

    /// Dashed form used by Coinbase (e.g. `BTC-USD`)
    pub fn dashed(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }

    /// This pair followed by the pairs most exchanges treat as equivalent.
    ///
    /// USD stablecoins are interchangeable for leadership purposes, so a
    /// `BTC/USDT` request may be served from `BTC-USD` on a venue that has
    /// no USDT book.
    pub fn equivalents(&self) -> Vec<TradingPair> {
        let mut pairs = vec![self.clone()];
        let dollar_quotes = ["USDT", "USD", "USDC"];
        if dollar_quotes.contains(&self.quote.as_str()) {
            for quote in dollar_quotes {
                if quote != self.quote {
                    pairs.push(TradingPair::new(&self.base, quote));
                }
            }
        }
        pairs
    }
}

impl FromStr for TradingPair {
    type Err = DetectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s.trim().to_uppercase();
        if let Some((base, quote)) = cleaned.split_once(['/', '-', '_', ':']) {
            if !base.is_empty() && !quote.is_empty() {
                return Ok(TradingPair::new(base, quote));
            }
        } else {
            for quote in KNOWN_QUOTES {
                if let Some(base) = cleaned.strip_suffix(quote) {
                    if !base.is_empty() {
                        return Ok(TradingPair::new(base, quote));
                    }
                }
            }
        }
        Err(DetectError::InvalidSymbol(s.to_string()))
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// A single executed trade as reported by an exchange
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Execution time (epoch milliseconds)
    pub ts: i64,
    pub price: f64,
}

impl Trade {
    pub fn new(ts: i64, price: f64) -> Self {
        Self { ts, price }
    }

    pub fn is_valid(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}
