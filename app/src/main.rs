// In app/src/main.rs

use anyhow::{Context, Result};
use app_config::Settings;
use backtester::Backtester;
use bar_cache::{BarCache, MonthKey};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use core_types::{Bar, BarSeries, ErrorKind, Symbol};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::time::Instant;
use strategies::ma_crossover::MACrossover;
use tokio::task;
use tracing_subscriber::prelude::*;

mod analyzer;
mod optimizer;

use crate::analyzer::RankedReport;
use crate::optimizer::{generate_parameter_sets, load_optimizer_config, run_optimization};

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Fetch GMO Coin klines and backtest a moving-average crossover on them.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Downloads klines day by day and stores them in the monthly cache.
    Fetch {
        /// The asset symbol (e.g., "BTC").
        #[arg(short, long)]
        symbol: String,

        /// The kline interval (e.g., "1min", "1hour").
        #[arg(short, long, default_value = "1min")]
        interval: String,

        /// First trading day to fetch, YYYY-MM-DD.
        #[arg(long)]
        start_date: NaiveDate,

        /// Last trading day to fetch, YYYY-MM-DD (inclusive).
        #[arg(long)]
        end_date: NaiveDate,
    },

    /// Prints a summary of one cached month.
    Inspect {
        #[arg(short, long)]
        symbol: String,

        #[arg(short, long, default_value = "1min")]
        interval: String,

        #[arg(long)]
        year: i32,

        #[arg(long)]
        month: u32,
    },

    /// Runs a historical backtest of the crossover strategy.
    Backtest {
        #[arg(short, long)]
        symbol: String,

        #[arg(short, long, default_value = "1min")]
        interval: String,

        /// The start date for the backtest in YYYY-MM-DD format.
        #[arg(long)]
        start_date: NaiveDate,

        /// The end date for the backtest in YYYY-MM-DD format.
        #[arg(long)]
        end_date: NaiveDate,

        /// Overrides `strategies.ma_crossover.short_window`.
        #[arg(long)]
        short_window: Option<usize>,

        /// Overrides `strategies.ma_crossover.mid_window`.
        #[arg(long)]
        mid_window: Option<usize>,

        /// Overrides `backtest.initial_balance`.
        #[arg(long)]
        initial_balance: Option<Decimal>,

        /// Download trading days that are not in the cache before running.
        #[arg(long)]
        fetch_missing: bool,
    },

    /// Runs the parameter sweep described in config/optimizer.toml.
    Optimize,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let settings = app_config::load_settings().context("Failed to load settings")?;

    let default_level = settings.app.log_level.parse().unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::filter::Targets::new()
            .with_target("reqwest", tracing::Level::WARN)
            .with_target("hyper_util", tracing::Level::WARN)
            .with_default(default_level),
    );
    tracing_subscriber::registry().with(fmt_layer).init();

    let cli = Cli::parse();

    tracing::info!(environment = %settings.app.environment, "Starting crossover-lab");

    match cli.command {
        Commands::Fetch {
            symbol,
            interval,
            start_date,
            end_date,
        } => {
            handle_fetch(&settings, Symbol(symbol), interval, start_date, end_date).await?;
        }
        Commands::Inspect {
            symbol,
            interval,
            year,
            month,
        } => {
            handle_inspect(&settings, Symbol(symbol), interval, year, month)?;
        }
        Commands::Backtest {
            symbol,
            interval,
            start_date,
            end_date,
            short_window,
            mid_window,
            initial_balance,
            fetch_missing,
        } => {
            let options = BacktestOptions {
                short_window,
                mid_window,
                initial_balance,
                fetch_missing,
            };
            handle_backtest(&settings, Symbol(symbol), interval, start_date, end_date, options).await?;
        }
        Commands::Optimize => {
            handle_optimize(settings).await?;
        }
    }

    tracing::info!("crossover-lab has finished successfully.");

    Ok(())
}

// --- "Fetch" Subcommand Logic ---

/// Downloads `[start_date, end_date]` and writes it into the monthly cache.
async fn fetch_into_cache(
    settings: &Settings,
    cache: &BarCache,
    symbol: &Symbol,
    interval: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<MonthKey>> {
    let api_client = api_client::new(&settings.gmo)?;
    let bars = api_client.fetch_range(symbol, interval, start_date, end_date).await?;
    tracing::info!(count = bars.len(), "Received klines. Writing to cache.");
    Ok(cache.store(symbol, interval, &bars)?)
}

async fn handle_fetch(
    settings: &Settings,
    symbol: Symbol,
    interval: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<()> {
    let cache = BarCache::new(&settings.cache.root_dir);
    tracing::info!(symbol = %symbol, interval, %start_date, %end_date, "Starting fetch.");

    let keys = fetch_into_cache(settings, &cache, &symbol, &interval, start_date, end_date).await?;
    for key in &keys {
        println!("Saved {} to {}", key, cache.month_path(key).display());
    }
    Ok(())
}

// --- "Inspect" Subcommand Logic ---

fn handle_inspect(settings: &Settings, symbol: Symbol, interval: String, year: i32, month: u32) -> Result<()> {
    let cache = BarCache::new(&settings.cache.root_dir);
    let key = MonthKey::checked(&symbol, &interval, year, month)?;

    let Some(bars) = cache.load(&key)? else {
        println!("No cached data for {} ({})", key, cache.month_path(&key).display());
        return Ok(());
    };

    let summary = bar_cache::summarize(&bars);
    println!("\n=== {} ===", key);
    println!("Rows:        {}", summary.rows);
    if let (Some(first), Some(last)) = (summary.first, summary.last) {
        println!("From:        {}", first);
        println!("To:          {}", last);
    }
    if let (Some(min), Some(max), Some(mean)) = (summary.min_close, summary.max_close, summary.mean_close) {
        println!("Close:       min {} / max {} / mean {:.2}", min, max, mean);
    }
    println!("\nFirst rows:");
    for bar in bars.iter().take(5) {
        println!(
            "  {}  o={} h={} l={} c={} v={}",
            bar.open_time, bar.open, bar.high, bar.low, bar.close, bar.volume
        );
    }
    Ok(())
}

// --- "Backtest" Subcommand Logic ---

#[derive(Debug)]
struct BacktestOptions {
    short_window: Option<usize>,
    mid_window: Option<usize>,
    initial_balance: Option<Decimal>,
    fetch_missing: bool,
}

/// Trading days of `[start, end]` without a single cached bar.
fn missing_days(bars: &[Bar], start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let present: BTreeSet<NaiveDate> = bars.iter().map(|bar| bar_cache::trading_day(bar.open_time)).collect();
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| !present.contains(day))
        .collect()
}

async fn handle_backtest(
    settings: &Settings,
    symbol: Symbol,
    interval: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    options: BacktestOptions,
) -> Result<()> {
    // --- 1. Configuration ---
    let mut strategy_settings = settings.strategies.ma_crossover.unwrap_or_default();
    if let Some(short_window) = options.short_window {
        strategy_settings.short_window = short_window;
    }
    if let Some(mid_window) = options.mid_window {
        strategy_settings.mid_window = mid_window;
    }
    let initial_balance = options.initial_balance.unwrap_or(settings.backtest.initial_balance);
    let strategy = MACrossover::new(strategy_settings)?;

    // --- 2. Load Data ---
    let cache = BarCache::new(&settings.cache.root_dir);
    let mut bars = cache.load_range(&symbol, &interval, start_date, end_date)?;

    if options.fetch_missing {
        let missing = missing_days(&bars, start_date, end_date);
        if let (Some(first), Some(last)) = (missing.first(), missing.last()) {
            tracing::info!(missing = missing.len(), from = %first, to = %last, "Fetching days missing from the cache.");
            match fetch_into_cache(settings, &cache, &symbol, &interval, *first, *last).await {
                Ok(_) => bars = cache.load_range(&symbol, &interval, start_date, end_date)?,
                Err(e) => tracing::warn!(error = %e, "Could not fill the cache. Continuing with cached data."),
            }
        }
    }

    if bars.is_empty() {
        anyhow::bail!(
            "No cached bars for {} {} between {} and {}. Run `fetch` first or pass --fetch-missing.",
            symbol,
            interval,
            start_date,
            end_date
        );
    }
    tracing::info!(count = bars.len(), "Loaded bars for the specified date range.");
    let series = BarSeries::new(bars)?;

    // --- 3. Run ---
    let backtester = Backtester::new(symbol, interval, Box::new(strategy), initial_balance);
    match backtester.run(&series) {
        Ok((report, result)) => {
            backtester::print_report(&report);
            backtester::print_ledger(&result.ledger);
            Ok(())
        }
        Err(e) => {
            if e.kind() == ErrorKind::DataQuality {
                if let Some(ledger) = e.partial_ledger() {
                    println!("\nBacktest aborted. Trades executed before the failure:");
                    backtester::print_ledger(ledger);
                }
            }
            Err(e.into())
        }
    }
}

// --- "Optimize" Subcommand Logic ---

async fn handle_optimize(settings: Settings) -> Result<()> {
    let start_time = Instant::now();
    tracing::info!("Starting optimization job...");

    let optimizer_config = load_optimizer_config()?;
    let param_sets = generate_parameter_sets(&optimizer_config)?;
    if param_sets.is_empty() {
        anyhow::bail!("No valid parameter sets were generated.");
    }
    tracing::info!(job = %optimizer_config.job.name, "Starting optimization with {} parameter sets", param_sets.len());

    let job = optimizer_config.job;
    let symbol = Symbol(job.symbol.clone());
    let cache = BarCache::new(&settings.cache.root_dir);
    let bars = cache.load_range(&symbol, &job.interval, job.start_date, job.end_date)?;
    if bars.is_empty() {
        anyhow::bail!("No cached bars for job '{}'. Run `fetch` first.", job.name);
    }
    let series = BarSeries::new(bars)?;
    let initial_balance = job.initial_balance.unwrap_or(settings.backtest.initial_balance);
    let min_trades = job.min_trades;

    // Move the heavy, parallel work to a blocking thread.
    let runs = task::spawn_blocking(move || {
        run_optimization(&settings.app, &job, &series, initial_balance, &param_sets)
    })
    .await??;

    let ranked_results = analyzer::analyze_and_rank_results(runs, min_trades);
    print_optimization_report(&ranked_results);

    tracing::info!(duration = ?start_time.elapsed(), "Optimization job and analysis finished.");
    Ok(())
}

/// Helper function to print the final optimization summary.
fn print_optimization_report(results: &[RankedReport]) {
    println!("\n--- Optimization Job Complete ---");
    println!("---------------------------------");
    println!("Top 5 Parameter Sets by Net P&L:");
    println!("---------------------------------");

    for (i, ranked_report) in results.iter().take(5).enumerate() {
        println!("\n[Rank {} | Net P&L: {:.2}%]", i + 1, ranked_report.score);
        println!(
            "  - Parameters: {}",
            serde_json::to_string(&ranked_report.run.params).unwrap_or_default()
        );

        let report = &ranked_report.run.report;
        println!(
            "  - P&L: {:.2} | Max Drawdown: {:.2}% | Win Rate: {:.2}% | Trades: {}",
            report.net_pnl_absolute, report.max_drawdown_percentage, report.win_rate, report.total_trades
        );
    }
    println!("\n---------------------------------");

    if let Some(best) = results.first() {
        println!("Recommendation: The parameter set with the highest net P&L is:");
        println!("  {}", serde_json::to_string_pretty(&best.run.params).unwrap_or_default());
    } else {
        println!("Recommendation: No parameter sets passed the minimum trade threshold.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn missing_days_lists_uncached_trading_days() {
        let bar = |d: u32| Bar {
            open_time: Utc.with_ymd_and_hms(2024, 5, d, 0, 0, 0).unwrap(),
            open: dec!(1),
            high: dec!(1),
            low: dec!(1),
            close: dec!(1),
            volume: dec!(1),
        };
        let day = |d: u32| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();

        let missing = missing_days(&[bar(1), bar(3)], day(1), day(4));
        assert_eq!(missing, vec![day(2), day(4)]);
        assert!(missing_days(&[bar(1)], day(1), day(1)).is_empty());
    }

    #[test]
    fn cli_parses_backtest_overrides() {
        let cli = Cli::try_parse_from([
            "crossover-lab",
            "backtest",
            "--symbol",
            "BTC",
            "--start-date",
            "2024-01-01",
            "--end-date",
            "2024-01-31",
            "--short-window",
            "5",
            "--initial-balance",
            "2500.5",
            "--fetch-missing",
        ])
        .unwrap();
        match cli.command {
            Commands::Backtest {
                interval,
                short_window,
                mid_window,
                initial_balance,
                fetch_missing,
                ..
            } => {
                assert_eq!(interval, "1min");
                assert_eq!(short_window, Some(5));
                assert_eq!(mid_window, None);
                assert_eq!(initial_balance, Some(dec!(2500.5)));
                assert!(fetch_missing);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
