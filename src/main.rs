// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Chargeflow entry point - a CLI driver for the charge workflow.
//!
//! Stands in for whatever transport a host service would expose: it builds a
//! charge request from arguments, wires the processor with the simulated
//! gateway, runs one charge, and prints the outcome.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use colored::Colorize;

use chargeflow::flags::{
    EnvFlagSource, SharedFlagSource, StaticFlagSource, PAYMENT_FAILURE_RATE_FLAG,
    PAYMENT_RETRY_MAX_FLAG,
};
use chargeflow::gateway::SimulatedGateway;
use chargeflow::processor::{
    ChargeContext, ChargeProcessor, ChargeProcessorOptions, ProcessorConfig,
};
use chargeflow::runtime::{SharedClock, SharedRandom, SystemClock, ThreadRngSource};
use chargeflow::telemetry::{init_telemetry, ChargeMetrics, TelemetryConfig};
use chargeflow::types::{ChargeRequest, CreditCardInfo, Money};
use chargeflow::ChargeError;

/// Chargeflow - charge a card through the simulated payment workflow.
#[derive(Parser)]
#[command(name = "chargeflow")]
#[command(author, version, about = "Payment charge workflow demo", long_about = None)]
struct Cli {
    /// Card number (separators allowed)
    #[arg(short, long, default_value = "4111-1111-1111-1111")]
    number: String,

    /// Card verification value
    #[arg(long, default_value_t = 123)]
    cvv: i32,

    /// Expiration month (1-12)
    #[arg(long, default_value_t = 1)]
    exp_month: u32,

    /// Expiration year
    #[arg(long, default_value_t = 2030)]
    exp_year: i32,

    /// Amount to charge, decimal
    #[arg(short, long, default_value = "49.99")]
    amount: String,

    /// ISO 4217 currency code
    #[arg(short, long, default_value = "USD", env = "CHARGEFLOW_CURRENCY")]
    currency: String,

    /// Failure-injection rate in [0,1]; unset falls back to env flags
    #[arg(long)]
    failure_rate: Option<f64>,

    /// Maximum charge attempts; unset falls back to env flags
    #[arg(long)]
    retry_max: Option<f64>,

    /// Mark the request as synthetic traffic (never counted as a real charge)
    #[arg(long)]
    synthetic: bool,

    /// Print a metrics report after the charge
    #[arg(long)]
    report: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Show verbose output (per-attempt logging)
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Warnings only
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Text,
    /// JSON for scripting
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let telemetry = if cli.verbose {
        TelemetryConfig::verbose()
    } else if cli.quiet {
        TelemetryConfig::quiet()
    } else {
        TelemetryConfig::default()
    };
    let _guard = init_telemetry(&telemetry).context("failed to initialize telemetry")?;

    let amount = Money::from_decimal_str(cli.currency.as_str(), &cli.amount)
        .context("invalid --amount / --currency")?;
    let request = ChargeRequest::new(
        amount,
        CreditCardInfo::new(cli.number.as_str(), cli.cvv, cli.exp_year, cli.exp_month),
    );

    let flags = build_flags(&cli);
    let clock: SharedClock = Arc::new(SystemClock);
    let random: SharedRandom = Arc::new(ThreadRngSource);
    let metrics = Arc::new(ChargeMetrics::new());
    let processor = ChargeProcessor::new(ChargeProcessorOptions {
        gateway: Arc::new(SimulatedGateway::new(random.clone(), clock.clone())),
        flags,
        metrics: metrics.clone(),
        clock,
        random,
        config: ProcessorConfig::default(),
    });

    let ctx = ChargeContext {
        synthetic: cli.synthetic,
    };
    let outcome = processor.charge_with(request, ctx).await;

    match cli.format {
        OutputFormat::Text => print_text(&outcome),
        OutputFormat::Json => print_json(&outcome)?,
    }

    if cli.report {
        println!("\n{}", metrics.snapshot().format_report());
    }

    if outcome.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

/// Explicit CLI values win; with neither given, environment flags apply.
fn build_flags(cli: &Cli) -> SharedFlagSource {
    let mut flags = StaticFlagSource::new();
    if let Some(rate) = cli.failure_rate {
        flags.set(PAYMENT_FAILURE_RATE_FLAG, rate);
    }
    if let Some(max) = cli.retry_max {
        flags.set(PAYMENT_RETRY_MAX_FLAG, max);
    }

    if flags.is_empty() {
        Arc::new(EnvFlagSource::new())
    } else {
        Arc::new(flags)
    }
}

fn print_text(outcome: &Result<chargeflow::ChargeResult, ChargeError>) {
    match outcome {
        Ok(result) => {
            println!(
                "{} transaction {} ({} ending {}, {} retries)",
                "charged".green().bold(),
                result.transaction_id,
                result.card_type,
                result.last_four_digits,
                result.retry_count,
            );
        }
        Err(err) => {
            println!("{} [{}] {}", "declined".red().bold(), err.code(), err);
        }
    }
}

fn print_json(outcome: &Result<chargeflow::ChargeResult, ChargeError>) -> anyhow::Result<()> {
    let value = match outcome {
        Ok(result) => serde_json::to_value(result)?,
        Err(err) => serde_json::json!({
            "success": false,
            "code": err.code(),
            "message": err.to_string(),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
