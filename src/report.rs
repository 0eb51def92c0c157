//! Plain-text rendering of detection reports and arbitrage outcomes

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::arbitrage::{ArbitrageOutcome, Route};
use crate::detector::DetectionReport;

fn format_ts(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// Ranked leadership table followed by the excluded candidates
pub fn render_detection(report: &DetectionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Price source detection for {} on {} ({} → {} UTC, {} samples)",
        report.pair,
        report.target,
        format_ts(report.window_start_ms),
        format_ts(report.window_end_ms),
        report.target_samples,
    );
    out.push('\n');

    if report.ranked.is_empty() {
        out.push_str("No candidate exchange produced usable data.\n");
    } else {
        let _ = writeln!(
            out,
            "{:<4} {:<10} {:>8} {:>5} {:>10} {:>8} {:>7}",
            "#", "exchange", "corr", "lag", "granger p", "score", "samples"
        );
        for (i, r) in report.ranked.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:<4} {:<10} {:>8.4} {:>5} {:>10.4} {:>8.4} {:>7}",
                i + 1,
                r.exchange.to_string(),
                r.best_correlation,
                r.best_lag,
                r.granger_p_value,
                r.score,
                r.aligned_samples,
            );
        }
        if let Some(leader) = report.leader() {
            let _ = writeln!(
                out,
                "\nMost likely price source: {} (score {:.4})",
                leader.exchange, leader.score
            );
        }
    }

    if !report.excluded.is_empty() {
        out.push_str("\nExcluded:\n");
        for ex in &report.excluded {
            let _ = writeln!(out, "  {:<10} {}", ex.exchange, ex.reason);
        }
    }
    out
}

/// Both directions plus the recommendation, one line each
pub fn render_arbitrage(outcome: &ArbitrageOutcome) -> String {
    let a = &outcome.venue_a;
    let b = &outcome.venue_b;
    let mut out = String::new();
    let _ = writeln!(out, "Buy on {a} → Sell on {b}: {:.2}%", outcome.buy_a_sell_b_pct);
    let _ = writeln!(out, "Buy on {b} → Sell on {a}: {:.2}%", outcome.buy_b_sell_a_pct);

    match outcome.recommendation {
        Some(rec) => {
            let (buy, sell) = match rec.route {
                Route::BuyASellB => (a, b),
                Route::BuyBSellA => (b, a),
            };
            let _ = writeln!(
                out,
                "Best option: buy on {buy} and sell on {sell} for {:.2}% profit.",
                rec.yield_pct
            );
        }
        None => out.push_str("No profitable arbitrage opportunity at the moment.\n"),
    }
    out
}
