//! Error types for market-data sources, the detector and the arbitrage tool
//!
//! Only target-fetch failures abort a detection run. Everything else is
//! mapped into an [`ExclusionReason`] for the affected candidate or into a
//! safe statistical default.

use serde::Serialize;
use thiserror::Error;

use crate::types::ExchangeId;

/// Failure reported by a single exchange adapter.
#[derive(Debug, Error)]
pub enum SourceError {
    /// None of the pair's equivalent spellings exist on the venue.
    #[error("symbol {symbol} not listed on {exchange}")]
    SymbolNotFound { exchange: ExchangeId, symbol: String },

    /// The venue answered with a non-success status.
    #[error("{exchange} returned HTTP {status}: {body}")]
    Api {
        exchange: ExchangeId,
        status: u16,
        body: String,
    },

    /// Transport failure, including the client-side request timeout.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("could not decode {exchange} response: {msg}")]
    Decode { exchange: ExchangeId, msg: String },
}

/// Errors that abort a whole detection run.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("unknown exchange: {0}")]
    UnknownExchange(String),

    #[error("unrecognised trading symbol: {0}")]
    InvalidSymbol(String),

    /// The target could not supply data, so there is nothing to compare against.
    #[error("no usable data from {exchange}: {reason}")]
    DataUnavailable { exchange: String, reason: String },

    #[error("no market data source registered for {0}")]
    SourceNotRegistered(ExchangeId),
}

/// Why a candidate exchange was left out of the ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Identifier did not name a supported exchange.
    UnknownExchange,
    /// Fetch failed or the symbol could not be resolved.
    Unavailable { message: String },
    /// Fetch succeeded but returned no usable trades inside the window.
    NoTrades,
    /// Too few overlapping samples with the target.
    InsufficientAlignment { aligned: usize, required: usize },
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::UnknownExchange => write!(f, "unknown exchange"),
            ExclusionReason::Unavailable { message } => write!(f, "unavailable: {message}"),
            ExclusionReason::NoTrades => write!(f, "no trades in window"),
            ExclusionReason::InsufficientAlignment { aligned, required } => {
                write!(f, "only {aligned} aligned samples (need {required})")
            }
        }
    }
}

/// Arbitrage input could not be evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArbitrageError {
    /// A price is missing (zero), negative or not a number.
    #[error("please fill in all price fields: {field} = {value}")]
    IncompleteInput { field: &'static str, value: f64 },

    #[error("fee percentage must be a non-negative number, got {0}")]
    InvalidFee(f64),
}
