// In crates/backtester/src/lib.rs

pub mod account;
pub mod error;
pub mod ledger;
pub mod simulation;

use analytics::{AnalyticsEngine, PerformanceReport};
use core_types::{BarSeries, Symbol, TradeRecord};
use rust_decimal::Decimal;
use strategies::Strategy;

pub use account::Account;
pub use error::{Error, Result};
pub use ledger::TradeLedger;
pub use simulation::{BacktestResult, Simulation, simulate};

/// Runs a strategy over a bar series and reports the outcome.
pub struct Backtester {
    /// The symbol being tested.
    pub symbol: Symbol,
    /// The bar interval of the series (e.g. "1min").
    pub interval: String,
    /// A single strategy instance to test.
    pub strategy: Box<dyn Strategy + Send + Sync>,
    initial_balance: Decimal,
}

impl Backtester {
    pub fn new(
        symbol: Symbol,
        interval: String,
        strategy: Box<dyn Strategy + Send + Sync>,
        initial_balance: Decimal,
    ) -> Self {
        Self {
            symbol,
            interval,
            strategy,
            initial_balance,
        }
    }

    pub fn initial_balance(&self) -> Decimal {
        self.initial_balance
    }

    /// Labels the series with the strategy's signals and simulates them.
    ///
    /// Configuration problems (balance, empty series) are reported before the
    /// strategy is even evaluated.
    pub fn run(&self, series: &BarSeries) -> Result<(PerformanceReport, BacktestResult)> {
        if self.initial_balance <= Decimal::ZERO {
            return Err(Error::NonPositiveBalance(self.initial_balance));
        }
        if series.is_empty() {
            return Err(Error::EmptySeries);
        }

        tracing::info!(
            symbol = %self.symbol,
            interval = %self.interval,
            strategy = self.strategy.name(),
            bars = series.len(),
            "Starting backtest."
        );

        let warmup_bars = self.strategy.warmup_bars();
        if series.len() <= warmup_bars {
            tracing::warn!(
                bars = series.len(),
                warmup_bars,
                "Series is not longer than the strategy warm-up; no trade can trigger."
            );
        }

        let signals = self.strategy.signals(series)?;
        let result = simulate(series, &signals, self.initial_balance)?;

        tracing::info!(
            final_balance = %result.final_balance,
            pnl = %result.profit_loss(),
            trades = result.ledger.len(),
            "Backtest finished."
        );

        let report = AnalyticsEngine::new().calculate(result.initial_balance, result.final_balance, &result.ledger);
        Ok((report, result))
    }
}

/// Helper function to print the performance report in a readable format.
pub fn print_report(report: &PerformanceReport) {
    println!("\n--- Backtest Performance Report ---");
    println!("-----------------------------------");
    println!("Initial Balance:       {:.2}", report.initial_balance);
    println!("Final Balance:         {:.2}", report.final_balance);
    println!("Net P&L:               {:.2} ({:.2}%)", report.net_pnl_absolute, report.net_pnl_percentage);
    println!("-----------------------------------");
    println!("Round Trips:           {}", report.total_trades);
    println!("Win Rate:              {:.2}%", report.win_rate);
    if report.total_trades > 0 {
        println!("Best Trade:            {:.2}%", report.best_trade_pct);
        println!("Worst Trade:           {:.2}%", report.worst_trade_pct);
    }
    println!("Max Drawdown:          {:.2}%", report.max_drawdown_percentage);
    println!("-----------------------------------");
}

/// Prints every record of a trade ledger, one per line.
pub fn print_ledger(ledger: &[TradeRecord]) {
    println!("\nTrade Ledger:");
    if ledger.is_empty() {
        println!("  (no trades)");
        return;
    }
    for record in ledger {
        println!("  {}  {:<4}  {}", record.timestamp, record.action, record.price);
    }
}
