// In crates/strategies/src/lib.rs

use core_types::{BarSeries, Signal};
pub mod error;
pub mod factory;
pub mod ma_crossover;
pub mod sma;
pub mod types;

pub use error::{Error, Result};

/// The universal interface for a trading strategy.
///
/// A strategy labels every bar of a series with a `Signal`. It is a pure
/// function of the series: the same input always yields the same labels, and
/// the output is aligned index-for-index with the input.
pub trait Strategy {
    /// The name of the strategy.
    fn name(&self) -> &'static str;

    /// The number of leading bars that can never carry a Buy or Sell.
    fn warmup_bars(&self) -> usize;

    fn signals(&self, series: &BarSeries) -> Result<Vec<Signal>>;
}
