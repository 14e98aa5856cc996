// In crates/core-types/src/series.rs

use crate::{Bar, Error, Result};
use rust_decimal::Decimal;

/// An immutable, strictly time-ordered sequence of bars.
///
/// Construction is the only place ordering is checked, so every consumer can
/// rely on `open_time` increasing with the index. Neighbour access is
/// bounds-checked and returns `None` at the edges instead of panicking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Builds a series, rejecting duplicate or out-of-order timestamps.
    ///
    /// An empty series is allowed here; whether it is usable is up to the
    /// consumer (the backtester treats it as a configuration error).
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].open_time <= pair[0].open_time {
                return Err(Error::UnorderedTimestamps {
                    index: index + 1,
                    previous: pair[0].open_time,
                    current: pair[1].open_time,
                });
            }
        }
        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    /// The bar immediately before `index`, if there is one.
    pub fn previous(&self, index: usize) -> Option<&Bar> {
        index.checked_sub(1).and_then(|i| self.bars.get(i))
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.bars.len().checked_sub(1)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    pub fn closes(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.bars.iter().map(|bar| bar.close)
    }

    pub fn as_slice(&self) -> &[Bar] {
        &self.bars
    }

    pub fn into_inner(self) -> Vec<Bar> {
        self.bars
    }
}

impl<'a> IntoIterator for &'a BarSeries {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
