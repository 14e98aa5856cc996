// In crates/bar-cache/src/types.rs

use chrono::{DateTime, Utc};
use crate::{Error, Result};
use core_types::{Bar, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one monthly file of the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub symbol: String,
    pub interval: String,
    pub year: i32,
    /// 1-based calendar month.
    pub month: u32,
}

impl MonthKey {
    pub fn new(symbol: &Symbol, interval: &str, year: i32, month: u32) -> Self {
        Self {
            symbol: symbol.0.clone(),
            interval: interval.to_string(),
            year,
            month,
        }
    }

    /// Like [`MonthKey::new`], but rejects a month outside 1-12.
    pub fn checked(symbol: &Symbol, interval: &str, year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidMonth { month });
        }
        Ok(Self::new(symbol, interval, year, month))
    }

    /// The `YYYYMM` stem used as the file name.
    pub fn stem(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{:04}-{:02}", self.symbol, self.interval, self.year, self.month)
    }
}

/// The on-disk shape of a month file.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct MonthFile {
    pub symbol: String,
    pub interval: String,
    pub bars: Vec<Bar>,
}

/// Quick statistics over a block of cached bars.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CacheSummary {
    pub rows: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
    pub min_close: Option<Decimal>,
    pub max_close: Option<Decimal>,
    pub mean_close: Option<Decimal>,
}
