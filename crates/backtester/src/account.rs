// In crates/backtester/src/account.rs

use crate::{Error, Result};
use core_types::{Action, Bar, Position, Signal, TradeRecord};
use rust_decimal::Decimal;

/// Raised when a balance conversion does not fit in a `Decimal`, either too
/// large or so small that it rounds to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Overflow;

/// The cash and holdings of a single simulated run.
///
/// The whole balance is always deployed: a Buy turns all cash into quantity
/// and a Sell turns all quantity back into cash, so `cash > 0` exactly when
/// the position is flat.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    initial_balance: Decimal,
    cash: Decimal,
    position: Position,
}

impl Account {
    /// Opens an account holding `initial_balance` in cash.
    pub fn new(initial_balance: Decimal) -> Result<Self> {
        if initial_balance <= Decimal::ZERO {
            return Err(Error::NonPositiveBalance(initial_balance));
        }
        Ok(Self {
            initial_balance,
            cash: initial_balance,
            position: Position::Flat,
        })
    }

    pub fn initial_balance(&self) -> Decimal {
        self.initial_balance
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Cash plus the open position marked at `price`.
    pub fn equity(&self, price: Decimal) -> Decimal {
        self.cash + self.position.quantity() * price
    }

    /// Applies one bar's signal and returns the executed trade, if any.
    ///
    /// A Sell while flat and a Buy while long are no-ops. The caller
    /// guarantees `bar.close > 0`.
    pub(crate) fn apply(&mut self, signal: Signal, bar: &Bar) -> std::result::Result<Option<TradeRecord>, Overflow> {
        match (signal, self.position) {
            (Signal::Buy, Position::Flat) => {
                let quantity = self.cash.checked_div(bar.close).ok_or(Overflow)?;
                if quantity.is_zero() {
                    return Err(Overflow);
                }
                self.cash = Decimal::ZERO;
                self.position = Position::Long {
                    quantity,
                    entry_price: bar.close,
                };
                Ok(Some(TradeRecord {
                    action: Action::Buy,
                    price: bar.close,
                    timestamp: bar.open_time,
                }))
            }
            (Signal::Sell, Position::Long { .. }) => self.close_long(bar).map(Some),
            _ => Ok(None),
        }
    }

    /// Sells any open position at the bar's close.
    pub(crate) fn liquidate(&mut self, bar: &Bar) -> std::result::Result<Option<TradeRecord>, Overflow> {
        match self.position {
            Position::Long { .. } => self.close_long(bar).map(Some),
            Position::Flat => Ok(None),
        }
    }

    fn close_long(&mut self, bar: &Bar) -> std::result::Result<TradeRecord, Overflow> {
        let cash = self.position.quantity().checked_mul(bar.close).ok_or(Overflow)?;
        if cash.is_zero() {
            return Err(Overflow);
        }
        self.cash = cash;
        self.position = Position::Flat;
        Ok(TradeRecord {
            action: Action::Sell,
            price: bar.close,
            timestamp: bar.open_time,
        })
    }
}
