//! Two-venue arbitrage calculator
//!
//! Round-trip yield of buying on one venue and selling on the other, net of
//! one taker fee per leg. Prices are entered by hand; nothing is fetched.

use serde::Serialize;
use std::fmt;

use crate::error::ArbitrageError;

/// Manually entered prices for two venues plus the per-exchange fee
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageQuote {
    pub venue_a: String,
    pub venue_b: String,
    pub buy_a: f64,
    pub sell_a: f64,
    pub buy_b: f64,
    pub sell_b: f64,
    /// Fee per exchange in percent (0.1 = 0.1%)
    pub fee_percent: f64,
}

/// Which way to run the round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    BuyASellB,
    BuyBSellA,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommendation {
    pub route: Route,
    pub yield_pct: f64,
}

/// Both directional yields, in percent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageOutcome {
    pub venue_a: String,
    pub venue_b: String,
    pub buy_a_sell_b_pct: f64,
    pub buy_b_sell_a_pct: f64,
    /// `None` when neither direction is profitable
    pub recommendation: Option<Recommendation>,
}

impl ArbitrageOutcome {
    pub fn is_profitable(&self) -> bool {
        self.recommendation.is_some()
    }
}

/// Net yield in percent of buying at `buy` and selling at `sell`, two fee legs
pub fn round_trip_yield_pct(buy: f64, sell: f64, fee_fraction: f64) -> f64 {
    ((sell - buy) / buy - 2.0 * fee_fraction) * 100.0
}

impl ArbitrageQuote {
    fn check_inputs(&self) -> Result<(), ArbitrageError> {
        let prices = [
            ("buy_a", self.buy_a),
            ("sell_a", self.sell_a),
            ("buy_b", self.buy_b),
            ("sell_b", self.sell_b),
        ];
        for (field, value) in prices {
            if !(value.is_finite() && value > 0.0) {
                return Err(ArbitrageError::IncompleteInput { field, value });
            }
        }
        if !(self.fee_percent.is_finite() && self.fee_percent >= 0.0) {
            return Err(ArbitrageError::InvalidFee(self.fee_percent));
        }
        Ok(())
    }

    /// Compute both yields; withheld entirely if any price is missing
    pub fn evaluate(&self) -> Result<ArbitrageOutcome, ArbitrageError> {
        self.check_inputs()?;

        let fee = self.fee_percent / 100.0;
        let buy_a_sell_b_pct = round_trip_yield_pct(self.buy_a, self.sell_b, fee);
        let buy_b_sell_a_pct = round_trip_yield_pct(self.buy_b, self.sell_a, fee);

        // a route must beat the other strictly; equal yields recommend nothing
        let recommendation = if buy_a_sell_b_pct > buy_b_sell_a_pct && buy_a_sell_b_pct > 0.0 {
            Some(Recommendation {
                route: Route::BuyASellB,
                yield_pct: buy_a_sell_b_pct,
            })
        } else if buy_b_sell_a_pct > buy_a_sell_b_pct && buy_b_sell_a_pct > 0.0 {
            Some(Recommendation {
                route: Route::BuyBSellA,
                yield_pct: buy_b_sell_a_pct,
            })
        } else {
            None
        };

        Ok(ArbitrageOutcome {
            venue_a: self.venue_a.clone(),
            venue_b: self.venue_b.clone(),
            buy_a_sell_b_pct,
            buy_b_sell_a_pct,
            recommendation,
        })
    }

    /// Same quote with the venues' roles exchanged
    pub fn swapped(&self) -> Self {
        Self {
            venue_a: self.venue_b.clone(),
            venue_b: self.venue_a.clone(),
            buy_a: self.buy_b,
            sell_a: self.sell_b,
            buy_b: self.buy_a,
            sell_b: self.sell_a,
            fee_percent: self.fee_percent,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::BuyASellB => write!(f, "buy A / sell B"),
            Route::BuyBSellA => write!(f, "buy B / sell A"),
        }
    }
}
