// In crates/backtester/src/simulation.rs

use crate::account::Account;
use crate::ledger::TradeLedger;
use crate::{Error, Result};
use core_types::{BarSeries, Signal, TradeRecord};
use rust_decimal::Decimal;

/// The outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub initial_balance: Decimal,
    /// Cash after the final liquidation. Never includes an open position.
    pub final_balance: Decimal,
    pub ledger: Vec<TradeRecord>,
}

impl BacktestResult {
    pub fn profit_loss(&self) -> Decimal {
        self.final_balance - self.initial_balance
    }
}

/// A single-position backtest advanced one bar at a time.
///
/// The state after every `step` is a valid checkpoint: the account and
/// ledger can be inspected, and the caller may stop stepping at any time
/// without leaving anything half-applied.
#[derive(Debug)]
pub struct Simulation<'a> {
    series: &'a BarSeries,
    signals: &'a [Signal],
    account: Account,
    ledger: TradeLedger,
    /// Index of the next bar to process.
    cursor: usize,
}

impl<'a> Simulation<'a> {
    /// Validates the inputs and opens a flat account.
    ///
    /// Every configuration and alignment check happens here, before any bar
    /// is processed.
    pub fn new(series: &'a BarSeries, signals: &'a [Signal], initial_balance: Decimal) -> Result<Self> {
        let account = Account::new(initial_balance)?;
        if series.is_empty() {
            return Err(Error::EmptySeries);
        }
        if signals.len() != series.len() {
            return Err(Error::SignalLengthMismatch {
                signals: signals.len(),
                bars: series.len(),
            });
        }
        if signals[0] != Signal::Hold {
            return Err(Error::ActionableFirstSignal(signals[0]));
        }
        Ok(Self {
            series,
            signals,
            account,
            ledger: TradeLedger::new(),
            cursor: 0,
        })
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    /// Index of the next bar `step` will process.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.series.len()
    }

    /// Processes the bar at the cursor and returns its index, or `None` once
    /// every bar has been processed.
    ///
    /// A bar with a non-positive close aborts the run; the cursor stays on
    /// that bar so the failure is reported again if stepping continues.
    pub fn step(&mut self) -> Result<Option<usize>> {
        let index = self.cursor;
        let Some(bar) = self.series.get(index) else {
            return Ok(None);
        };

        if bar.close <= Decimal::ZERO {
            tracing::error!(index, close = %bar.close, "Non-positive close price. Aborting run.");
            return Err(Error::NonPositiveClose {
                index,
                close: bar.close,
                ledger: self.ledger.records().to_vec(),
            });
        }

        // A bar without a predecessor is never actionable.
        if self.series.previous(index).is_some() {
            let traded = self.account.apply(self.signals[index], bar).map_err(|_| Error::Overflow {
                index,
                ledger: self.ledger.records().to_vec(),
            })?;
            if let Some(trade) = traded {
                self.ledger.record(trade);
            }
        }

        self.cursor += 1;
        Ok(Some(index))
    }

    /// Processes every remaining bar, liquidates any open position at the
    /// last close, and returns the result.
    pub fn finish(mut self) -> Result<BacktestResult> {
        while self.step()?.is_some() {}

        if let Some(index) = self.series.last_index() {
            if let Some(bar) = self.series.get(index) {
                let liquidation = self.account.liquidate(bar).map_err(|_| Error::Overflow {
                    index,
                    ledger: self.ledger.records().to_vec(),
                })?;
                if let Some(trade) = liquidation {
                    tracing::info!(price = %trade.price, time = %trade.timestamp, "Liquidated open position at series end.");
                    self.ledger.record(trade);
                }
            }
        }

        Ok(BacktestResult {
            initial_balance: self.account.initial_balance(),
            final_balance: self.account.cash(),
            ledger: self.ledger.into_records(),
        })
    }
}

/// Runs a complete backtest of `signals` over `series`.
pub fn simulate(series: &BarSeries, signals: &[Signal], initial_balance: Decimal) -> Result<BacktestResult> {
    Simulation::new(series, signals, initial_balance)?.finish()
}
