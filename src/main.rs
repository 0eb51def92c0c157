//! LeadProbe CLI
//!
//! `leadprobe arb`    - manual two-venue arbitrage calculator
//! `leadprobe detect` - rank reference exchanges by how well they lead a target

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use leadprobe::arbitrage::ArbitrageQuote;
use leadprobe::config::{AppConfig, LoggingConfig};
use leadprobe::detector::{DetectionRequest, PriceSourceDetector};
use leadprobe::error::ArbitrageError;
use leadprobe::oracle::SourceRegistry;
use leadprobe::report;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare manually entered prices on two venues
    Arb(ArbArgs),
    /// Score which reference exchange leads the target's price
    Detect(DetectArgs),
}

#[derive(Args, Debug)]
struct ArbArgs {
    /// Buy price on venue A
    #[arg(long, default_value_t = 0.0)]
    buy_a: f64,
    /// Sell price on venue A
    #[arg(long, default_value_t = 0.0)]
    sell_a: f64,
    /// Buy price on venue B
    #[arg(long, default_value_t = 0.0)]
    buy_b: f64,
    /// Sell price on venue B
    #[arg(long, default_value_t = 0.0)]
    sell_b: f64,
    /// Trading fee per exchange in percent
    #[arg(long)]
    fee: Option<f64>,
    /// Display name of venue A
    #[arg(long)]
    venue_a: Option<String>,
    /// Display name of venue B
    #[arg(long)]
    venue_b: Option<String>,
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// Exchange whose price source to identify
    #[arg(long, env = "LEADPROBE_TARGET")]
    target: Option<String>,
    /// Trading pair, e.g. BTC/USDT
    #[arg(long)]
    symbol: Option<String>,
    /// Comma-separated reference exchanges
    #[arg(long, value_delimiter = ',')]
    candidates: Option<Vec<String>>,
    /// History window in seconds
    #[arg(long)]
    lookback_secs: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    init_tracing(&config.logging);
    info!(config = %config, "Configuration loaded");

    match cli.command {
        Command::Arb(args) => run_arbitrage(&mut config, args, cli.json),
        Command::Detect(args) => run_detection(&mut config, args, cli.json).await,
    }
}

/// Initialize tracing; logs go to stderr so stdout carries only the report
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter.as_str()));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run_arbitrage(config: &mut AppConfig, args: ArbArgs, json: bool) -> Result<()> {
    if let Some(fee) = args.fee {
        config.arbitrage.fee_percent = fee;
    }
    if let Some(name) = args.venue_a {
        config.arbitrage.venue_a = name;
    }
    if let Some(name) = args.venue_b {
        config.arbitrage.venue_b = name;
    }

    let quote = ArbitrageQuote {
        venue_a: config.arbitrage.venue_a.clone(),
        venue_b: config.arbitrage.venue_b.clone(),
        buy_a: args.buy_a,
        sell_a: args.sell_a,
        buy_b: args.buy_b,
        sell_b: args.sell_b,
        fee_percent: config.arbitrage.fee_percent,
    };

    match quote.evaluate() {
        Ok(outcome) if json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        Ok(outcome) => print!("{}", report::render_arbitrage(&outcome)),
        Err(e @ ArbitrageError::IncompleteInput { .. }) => {
            eprintln!("Please fill in all price fields to calculate arbitrage opportunities ({e}).");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn run_detection(config: &mut AppConfig, args: DetectArgs, json: bool) -> Result<()> {
    let detector_cfg = &mut config.detector;
    if let Some(target) = args.target {
        detector_cfg.target_exchange = target;
    }
    if let Some(symbol) = args.symbol {
        detector_cfg.symbol = symbol;
    }
    if let Some(candidates) = args.candidates {
        detector_cfg.candidates = candidates;
    }
    if let Some(secs) = args.lookback_secs {
        detector_cfg.lookback_secs = secs;
    }
    config.validate()?;

    let request =
        DetectionRequest::from_config(&config.detector).context("Invalid detector settings")?;
    let registry = SourceRegistry::with_default_sources(&config.http)?;
    let report = PriceSourceDetector::new(&registry)
        .run(&request)
        .await
        .context("Price source detection failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report::render_detection(&report));
    }
    Ok(())
}
