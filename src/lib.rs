//! LeadProbe Library
//!
//! Cross-exchange arbitrage calculator and price-source leadership detector
//! for crypto spot markets

pub mod analysis;
pub mod arbitrage;
pub mod config;
pub mod detector;
pub mod error;
pub mod oracle;
pub mod report;
pub mod types;
