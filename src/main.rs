//! Loss-Bounded Position Sizing Calculator
//!
//! Sizes leveraged positions so that a stop-loss hit costs a fixed share of
//! the account, and estimates expected returns from win rate and R:R.

mod expectancy;
mod export;
mod models;
mod sizing;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::expectancy::ExpectancySimulator;
use crate::export::{fixed, percent, ratio_percent};
use crate::models::{ExpectancyInput, RawInstrumentRow};
use crate::sizing::{BatchOutcome, PositionSizer, SizingConfig};

/// Position sizing and expectancy calculator CLI.
#[derive(Parser)]
#[command(name = "riskcalc")]
#[command(about = "Size leveraged positions by maximum loss and estimate expectancy", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Size positions for a batch of instruments
    Size {
        /// Account balance in quote currency
        #[arg(short, long, default_value = "10000")]
        balance: Decimal,

        /// Percentage of the balance to lose if a stop is hit
        #[arg(short, long, default_value = "3")]
        risk: Decimal,

        #[command(flatten)]
        config: ConfigArgs,

        /// Instrument row as SYMBOL:ENTRY:STOP_PCT:LEVERAGE (repeatable)
        #[arg(long = "row")]
        rows: Vec<RawInstrumentRow>,

        /// CSV file with symbol,entry_price,stop_loss_pct,leverage columns
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Write results to this CSV file ("-" for stdout)
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Estimate expected monthly and annual return
    Expectancy {
        /// Win rate percentage (0-100)
        #[arg(short, long)]
        win_rate: Decimal,

        /// Reward:risk ratio
        #[arg(long)]
        rr: Decimal,

        /// Trades per month
        #[arg(short, long, default_value = "30")]
        trades: u32,

        /// Starting capital
        #[arg(short, long, default_value = "10000")]
        capital: Decimal,

        /// Percentage of capital risked per trade (0-100)
        #[arg(short, long, default_value = "2")]
        risk: Decimal,

        /// Print the month-by-month compounded equity
        #[arg(long)]
        projection: bool,
    },

    /// Show the effective sizing configuration
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

/// Sizing constants, overridable by flag or environment.
#[derive(clap::Args)]
struct ConfigArgs {
    /// Taker fee per fill as a fraction of notional
    #[arg(long, env = "RISKCALC_FEE_RATE")]
    fee_rate: Option<Decimal>,

    /// Maximum stop-loss distance in percent
    #[arg(long, env = "RISKCALC_MAX_STOP_LOSS_PCT")]
    max_stop_loss: Option<Decimal>,
}

impl ConfigArgs {
    fn into_config(self) -> SizingConfig {
        let defaults = SizingConfig::default();
        SizingConfig {
            fee_rate: self.fee_rate.unwrap_or(defaults.fee_rate),
            max_stop_loss_pct: self.max_stop_loss.unwrap_or(defaults.max_stop_loss_pct),
        }
    }
}

fn main() -> Result<()> {
    // Pick up RISKCALC_* overrides from a local .env, if any
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Size {
            balance,
            risk,
            config,
            rows,
            input,
            export: export_path,
        } => {
            let sizer = PositionSizer::new(config.into_config())?;

            let mut table = rows;
            if let Some(path) = &input {
                table.extend(export::read_rows(path)?);
            }
            if table.is_empty() {
                info!("No rows given, using the sample table");
                table = RawInstrumentRow::defaults();
            }

            info!(
                balance = %balance,
                risk = %risk,
                rows = table.len(),
                "Sizing positions"
            );

            let batch = sizer.size(balance, risk, &table)?;

            for rejection in batch.warnings() {
                println!(
                    "WARNING: row {} ({}) skipped: {}",
                    rejection.row_index + 1,
                    rejection.symbol,
                    rejection.error
                );
            }

            match batch.outcome() {
                BatchOutcome::Blocked { violations } => {
                    println!(
                        "\nERROR: stop-loss above {}% on the following instruments, fix them and retry:",
                        sizer.config().max_stop_loss_pct
                    );
                    for v in batch.policy_violations() {
                        println!("  {}", v.label());
                    }
                    anyhow::bail!("{} instrument(s) exceed the stop-loss limit", violations.len());
                }
                BatchOutcome::Empty => {
                    println!("\nNo valid instruments to size. Check the input rows.");
                }
                BatchOutcome::Ready(results) => {
                    println!("\nMax loss per position: {}", fixed(batch.risk_amount, 2));
                    println!(
                        "\n{:<10} {:>12} {:>7} {:>14} {:>10} {:>12} {:>14} {:>12} {:>8}",
                        "SYMBOL", "ENTRY", "STOP%", "STOP POINT", "FEES", "SIZE", "VALUE", "MARGIN", "MARGIN%"
                    );
                    println!("{}", "-".repeat(107));

                    for r in results {
                        println!(
                            "{:<10} {:>12} {:>7} {:>14} {:>10} {:>12} {:>14} {:>12} {:>8}",
                            truncate(&r.symbol, 10),
                            r.entry_price.normalize().to_string(),
                            percent(r.stop_loss_pct),
                            fixed(r.stop_loss_point, 6),
                            fixed(r.total_fee, 2),
                            fixed(r.position_size, 4),
                            fixed(r.position_value, 2),
                            fixed(r.margin_used, 2),
                            ratio_percent(r.margin_ratio),
                        );
                    }

                    match export_path {
                        Some(path) if path.as_os_str() == "-" => {
                            std::io::stdout().write_all(&export::to_bytes(results)?)?;
                        }
                        Some(path) => {
                            export::write_results(results, &path)?;
                            println!("\nResults written to {}", path.display());
                        }
                        None => {}
                    }
                }
            }
        }

        Commands::Expectancy {
            win_rate,
            rr,
            trades,
            capital,
            risk,
            projection,
        } => {
            let input = ExpectancyInput {
                win_rate_pct: win_rate,
                rr_ratio: rr,
                trades_per_month: trades,
                capital,
                risk_pct: risk,
            };
            let result = ExpectancySimulator::simulate(&input)?;

            println!("\n=== Expectancy ===");
            println!("Risk per Trade:     {}", fixed(result.risk_amount, 2));
            println!("Expected Value:     {}R", fixed(result.expected_value, 4));
            println!("Expected per Trade: {}", fixed(result.expected_per_trade, 2));
            println!("Monthly Profit:     {}", fixed(result.monthly_profit, 2));
            println!("Monthly Return:     {}", ratio_percent(result.monthly_return));
            println!("Annual Return:      {}", ratio_percent(result.annual_return));
            println!("\nResult: {}", result.band());

            if projection {
                println!("\n{:>6} {:>20}", "MONTH", "EQUITY");
                println!("{}", "-".repeat(27));
                for (month, equity) in result.equity_curve.iter().enumerate() {
                    println!("{:>6} {:>20}", month + 1, fixed(*equity, 2));
                }
            }
        }

        Commands::Config { config } => {
            let config = config.into_config();
            if let Err(e) = config.validate() {
                warn!(error = %e, "Configuration is not usable");
            }

            println!("\n=== Sizing Configuration ===\n");
            println!("  Taker Fee:            {}", ratio_percent(config.fee_rate));
            println!("  Round-Trip Fee:       {}", ratio_percent(config.round_trip_fee_rate()));
            println!("  Max Stop Loss:        {}%", config.max_stop_loss_pct.normalize());
        }
    }

    Ok(())
}

/// Truncate a string with ellipsis if too long.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
