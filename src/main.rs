//! Tally CLI
//!
//! Allocates payment totals across the configured menus and prints one report per payment.

use std::{
    io::{self, Write},
    path::PathBuf,
    process,
    time::Instant,
};

use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use rand::{SeedableRng, rngs::StdRng};
use rust_decimal::Decimal;
use rusty_money::Money;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tally::{
    allocation::AllocationError,
    catalog::{MAX_AMOUNT, parse_amount},
    config::{ConfigError, TallyConfig},
    report::{AllocationReport, ReportError},
};

/// CLI errors
#[derive(Debug, Error)]
enum CliError {
    /// Config could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A payment could not be allocated
    #[error("failed to allocate '{payment}': {source}")]
    Allocation {
        /// Payment name
        payment: String,
        /// Underlying allocation error
        source: AllocationError,
    },

    /// A report could not be written
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Writing to stdout failed
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// A named payment total, such as `PIX=1520,50`.
#[derive(Debug, Clone)]
struct Payment {
    name: String,
    amount: Decimal,
}

fn parse_payment(raw: &str) -> Result<Payment, String> {
    let (name, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=AMOUNT, got '{raw}'"))?;

    let name = name.trim();

    if name.is_empty() {
        return Err(format!("missing payment name in '{raw}'"));
    }

    let amount = parse_amount(amount).ok_or_else(|| format!("invalid amount in '{raw}'"))?;

    if amount > MAX_AMOUNT {
        return Err(format!("amount in '{raw}' is above {MAX_AMOUNT}"));
    }

    Ok(Payment {
        name: name.to_string(),
        amount,
    })
}

/// Find plausible menu combinations for payment totals
#[derive(Debug, Parser)]
#[command(
    name = "tally",
    about = "Find plausible menu combinations for payment totals",
    long_about = None
)]
struct Cli {
    /// Allocation config file
    #[arg(short, long, env = "TALLY_CONFIG", default_value = "fixtures/clips_burger.yml")]
    config: PathBuf,

    /// Payment total to allocate, as NAME=AMOUNT; may be repeated
    #[arg(short, long = "payment", value_parser = parse_payment, required = true)]
    payments: Vec<Payment>,

    /// Seed for reproducible results
    #[arg(short, long)]
    seed: Option<u64>,

    /// Override the iterations per search
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    log_level: String,
}

/// Tally CLI entry point
pub fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&cli))
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(&cli) {
        error!("{err}");

        process::exit(1);
    }
}

/// `--log-level` already falls back to `RUST_LOG`, so the filter is built from it alone.
fn log_filter(cli: &Cli) -> EnvFilter {
    EnvFilter::new(&cli.log_level)
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let mut config = TallyConfig::from_path(&cli.config)?;

    if let Some(iterations) = cli.iterations {
        config.max_iterations = iterations;
    }

    let loaded = config.load()?;

    info!(
        config = %cli.config.display(),
        warnings = loaded.warnings.len(),
        "loaded menus"
    );

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    let start = Instant::now();

    for payment in &cli.payments {
        if payment.amount <= Decimal::ZERO {
            info!(payment = %payment.name, "skipping payment without a positive total");
            continue;
        }

        let total = Money::from_decimal(payment.amount, loaded.currency);

        let allocation = loaded
            .allocator
            .allocate(&total, &mut rng)
            .map_err(|source| CliError::Allocation {
                payment: payment.name.clone(),
                source,
            })?;

        AllocationReport::new(&payment.name, &allocation, &loaded.allocator).write_to(&mut handle)?;
    }

    writeln!(handle, "Solved in {}", start.elapsed().human(Truncate::Nano))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_payment_accepts_comma_amounts() -> Result<(), String> {
        let payment = parse_payment("Débito Visa=1520,50")?;

        assert_eq!(payment.name, "Débito Visa");
        assert_eq!(payment.amount, Decimal::new(152_050, 2));

        Ok(())
    }

    #[test]
    fn parse_payment_rejects_malformed_input() {
        assert!(parse_payment("PIX").is_err());
        assert!(parse_payment("=10").is_err());
        assert!(parse_payment("PIX=dez").is_err());
    }

    #[test]
    fn parse_payment_rejects_amounts_above_max() {
        assert!(parse_payment("PIX=79228162514264337593543950335").is_err());
        assert!(parse_payment("PIX=1000000000").is_ok());
    }

    #[test]
    fn cli_collects_repeated_payments() -> TestResult {
        let cli = Cli::try_parse_from([
            "tally",
            "-c",
            "menus.yml",
            "-p",
            "PIX=100",
            "-p",
            "Crédito Elo=50,5",
            "-s",
            "7",
        ])?;

        assert_eq!(cli.payments.len(), 2);
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.config, PathBuf::from("menus.yml"));

        Ok(())
    }

    #[test]
    fn config_defaults_to_shipped_fixture() -> TestResult {
        let command = Cli::command();
        let config = command
            .get_arguments()
            .find(|arg| arg.get_id() == "config")
            .ok_or("missing --config argument")?;

        let defaults: Vec<_> = config
            .get_default_values()
            .iter()
            .map(|value| value.to_str())
            .collect();

        assert_eq!(defaults, [Some("fixtures/clips_burger.yml")]);

        Ok(())
    }

    #[test]
    fn explicit_log_level_builds_the_filter() -> TestResult {
        let cli = Cli::try_parse_from(["tally", "-p", "PIX=1", "-l", "debug"])?;

        assert_eq!(cli.log_level, "debug");
        assert_eq!(log_filter(&cli).to_string(), "debug");

        Ok(())
    }
}
