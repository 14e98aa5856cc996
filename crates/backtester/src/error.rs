// In crates/backtester/src/error.rs

use core_types::{ErrorKind, Signal, TradeRecord};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("initial balance must be positive, got {0}")]
    NonPositiveBalance(Decimal),

    #[error("cannot backtest an empty bar series")]
    EmptySeries,

    #[error("signal sequence has {signals} entries but the bar series has {bars}")]
    SignalLengthMismatch { signals: usize, bars: usize },

    #[error("signal at bar 0 must be hold, got {0:?}")]
    ActionableFirstSignal(Signal),

    #[error("bar {index} has non-positive close {close}")]
    NonPositiveClose {
        index: usize,
        close: Decimal,
        /// Trades executed before the run was aborted. Advisory only.
        ledger: Vec<TradeRecord>,
    },

    #[error("balance arithmetic over- or underflowed at bar {index}")]
    Overflow { index: usize, ledger: Vec<TradeRecord> },

    #[error(transparent)]
    Strategy(#[from] strategies::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NonPositiveBalance(_) | Error::EmptySeries => ErrorKind::Configuration,
            Error::SignalLengthMismatch { .. } | Error::ActionableFirstSignal(_) => ErrorKind::InputAlignment,
            Error::NonPositiveClose { .. } | Error::Overflow { .. } => ErrorKind::DataQuality,
            Error::Strategy(e) => e.kind(),
        }
    }

    /// The trades recorded before a failed run stopped, if the run got that far.
    pub fn partial_ledger(&self) -> Option<&[TradeRecord]> {
        match self {
            Error::NonPositiveClose { ledger, .. } | Error::Overflow { ledger, .. } => Some(ledger),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
