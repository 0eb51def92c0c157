//! Configuration management for LeadProbe
//!
//! Loads from optional YAML/TOML files + environment variables via .env.
//! Every key has a default so the tool runs with no files at all.

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::analysis::AnalysisParams;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub detector: DetectorConfig,
    pub arbitrage: ArbitrageConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Exchange whose price source we try to identify
    pub target_exchange: String,
    /// Trading pair in any common spelling (BTC/USDT, BTCUSDT, BTC-USDT)
    pub symbol: String,
    /// Reference exchanges that may be leading the target
    pub candidates: Vec<String>,
    /// Trade history window in seconds, anchored at "now"
    pub lookback_secs: u64,
    /// Resample grid spacing in milliseconds
    pub resample_interval_ms: i64,
    /// Correlation scan covers lags -N..=N samples
    pub max_correlation_lag: usize,
    /// Granger test runs lag orders 1..=N
    pub granger_max_lag: usize,
    /// Score multiplier applied when the candidate appears to lead
    pub leader_bonus: f64,
    /// Fewer overlapping samples than this excludes a candidate
    pub min_aligned_samples: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArbitrageConfig {
    /// Display name of the first venue (prices buy_a/sell_a)
    pub venue_a: String,
    /// Display name of the second venue (prices buy_b/sell_b)
    pub venue_b: String,
    /// Trading fee per exchange, in percent
    pub fee_percent: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout enforced by the HTTP client
    pub timeout_ms: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of human-readable ones
    pub json: bool,
    /// Fallback filter when RUST_LOG is not set
    pub filter: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::builder_with_defaults()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (LEADPROBE__DETECTOR__SYMBOL=...)
            .add_source(
                Environment::with_prefix("LEADPROBE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("detector.candidates")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Defaults only, no files or environment
    pub fn defaults() -> Result<Self> {
        Self::builder_with_defaults()?
            .build()
            .context("Failed to build default configuration")?
            .try_deserialize()
            .context("Failed to deserialize default configuration")
    }

    fn builder_with_defaults() -> Result<config::builder::ConfigBuilder<config::builder::DefaultState>>
    {
        let builder = Config::builder()
            // Detector defaults
            .set_default("detector.target_exchange", "mexc")?
            .set_default("detector.symbol", "BTC/USDT")?
            .set_default("detector.candidates", vec!["binance", "bybit", "coinbase"])?
            .set_default("detector.lookback_secs", 180)?
            .set_default("detector.resample_interval_ms", 1000)?
            .set_default("detector.max_correlation_lag", 5)?
            .set_default("detector.granger_max_lag", 3)?
            .set_default("detector.leader_bonus", 1.2)?
            .set_default("detector.min_aligned_samples", 10)?
            // Arbitrage defaults
            .set_default("arbitrage.venue_a", "KCEX")?
            .set_default("arbitrage.venue_b", "Ourbit")?
            .set_default("arbitrage.fee_percent", 0.1)?
            // HTTP defaults
            .set_default("http.timeout_ms", 10_000)?
            .set_default(
                "http.user_agent",
                concat!("leadprobe/", env!("CARGO_PKG_VERSION")),
            )?
            // Logging defaults
            .set_default("logging.json", false)?
            .set_default("logging.filter", "leadprobe=info")?;
        Ok(builder)
    }

    /// Reject values the analysis cannot work with
    pub fn validate(&self) -> Result<()> {
        let d = &self.detector;
        if d.resample_interval_ms <= 0 {
            bail!("detector.resample_interval_ms must be positive");
        }
        if d.lookback_secs == 0 {
            bail!("detector.lookback_secs must be positive");
        }
        if d.max_correlation_lag == 0 {
            bail!("detector.max_correlation_lag must be at least 1");
        }
        if d.granger_max_lag == 0 {
            bail!("detector.granger_max_lag must be at least 1");
        }
        if !(d.leader_bonus.is_finite() && d.leader_bonus > 0.0) {
            bail!("detector.leader_bonus must be a positive number");
        }
        if d.min_aligned_samples < 3 {
            bail!("detector.min_aligned_samples must be at least 3");
        }
        if !(self.arbitrage.fee_percent.is_finite() && self.arbitrage.fee_percent >= 0.0) {
            bail!("arbitrage.fee_percent must be a non-negative number");
        }
        if self.http.timeout_ms == 0 {
            bail!("http.timeout_ms must be positive");
        }
        Ok(())
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "target={} symbol={} candidates={:?} lookback={}s interval={}ms lags=±{} granger<={}",
            self.detector.target_exchange,
            self.detector.symbol,
            self.detector.candidates,
            self.detector.lookback_secs,
            self.detector.resample_interval_ms,
            self.detector.max_correlation_lag,
            self.detector.granger_max_lag,
        )
    }
}

impl DetectorConfig {
    /// Parameters handed to the pure analysis functions
    pub fn analysis_params(&self) -> AnalysisParams {
        AnalysisParams {
            resample_interval_ms: self.resample_interval_ms,
            max_correlation_lag: self.max_correlation_lag,
            granger_max_lag: self.granger_max_lag,
            leader_bonus: self.leader_bonus,
            min_aligned_samples: self.min_aligned_samples,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
