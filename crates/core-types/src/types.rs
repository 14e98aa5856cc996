// In crates/core-types/src/types.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tradable asset symbol as the exchange spells it (e.g. "BTC").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One OHLCV sample for a fixed time interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// The UTC instant the interval opened at.
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// The per-bar label produced by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

/// The side of an executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Sell,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => f.pad("buy"),
            Action::Sell => f.pad("sell"),
        }
    }
}

/// A single executed action in the trade ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub action: Action,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// The holdings of a simulated account. There is never more than one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub enum Position {
    #[default]
    Flat,
    Long {
        quantity: Decimal,
        entry_price: Decimal,
    },
}

impl Position {
    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    /// The held quantity, zero when flat.
    pub fn quantity(&self) -> Decimal {
        match self {
            Position::Flat => Decimal::ZERO,
            Position::Long { quantity, .. } => *quantity,
        }
    }
}
