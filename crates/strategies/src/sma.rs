// In crates/strategies/src/sma.rs

use crate::{Error, Result};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// A lazy rolling mean over a stream of close prices.
///
/// Yields one item per input value. The item is `None` until `window` values
/// have been seen, then `Some(mean of the last window values)`. Warm-up values
/// are absent, never zero.
///
/// The window sum is kept in `Decimal`, so adding the newest close and
/// dropping the oldest is exact and two windows over equal prices produce
/// equal means no matter how long the series runs.
#[derive(Debug, Clone)]
pub struct RollingMean<I> {
    closes: I,
    values: VecDeque<Decimal>,
    sum: Decimal,
    divisor: Decimal,
    window: usize,
    name: &'static str,
    index: usize,
}

/// Builds a [`RollingMean`] over `closes` with the given window length.
///
/// `name` labels the errors ("short", "mid").
pub fn rolling_mean<I>(closes: I, window: usize, name: &'static str) -> Result<RollingMean<I::IntoIter>>
where
    I: IntoIterator<Item = Decimal>,
{
    if window == 0 {
        return Err(Error::ZeroWindow { name });
    }
    Ok(RollingMean {
        closes: closes.into_iter(),
        values: VecDeque::with_capacity(window),
        sum: Decimal::ZERO,
        divisor: Decimal::from(window),
        window,
        name,
        index: 0,
    })
}

impl<I> RollingMean<I> {
    pub fn window(&self) -> usize {
        self.window
    }
}

impl<I: Iterator<Item = Decimal>> RollingMean<I> {
    fn push(&mut self, close: Decimal) -> Option<Decimal> {
        let mut sum = self.sum.checked_add(close)?;
        self.values.push_back(close);
        if self.values.len() > self.window {
            let oldest = self.values.pop_front()?;
            sum = sum.checked_sub(oldest)?;
        }
        self.sum = sum;
        Some(sum)
    }
}

impl<I: Iterator<Item = Decimal>> Iterator for RollingMean<I> {
    type Item = Result<Option<Decimal>>;

    fn next(&mut self) -> Option<Self::Item> {
        let close = self.closes.next()?;
        let index = self.index;
        self.index += 1;

        let overflow = Error::MeanOverflow { name: self.name, index };
        let Some(sum) = self.push(close) else {
            return Some(Err(overflow));
        };
        if self.values.len() < self.window {
            return Some(Ok(None));
        }
        Some(sum.checked_div(self.divisor).map(Some).ok_or(overflow))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.closes.size_hint()
    }
}
