// In crates/bar-cache/src/lib.rs

//! A file-backed store of bars, one JSON file per trading month.
//!
//! The exchange's trading day starts at 06:00 JST, so a bar belongs to the
//! month of `open_time` in JST shifted back by six hours. Files live at
//! `{root}/{symbol}/{interval}/months/{YYYYMM}.json`.

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use core_types::{Bar, Symbol};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{CacheSummary, MonthKey};

use types::MonthFile;

const JST_OFFSET_HOURS: i64 = 9;
const TRADING_DAY_START_HOUR: i64 = 6;

/// The exchange trading day a timestamp falls on.
pub fn trading_day(ts: DateTime<Utc>) -> NaiveDate {
    (ts + TimeDelta::hours(JST_OFFSET_HOURS - TRADING_DAY_START_HOUR)).date_naive()
}

/// The `(year, month)` of the trading day a timestamp falls on.
pub fn trading_month(ts: DateTime<Utc>) -> (i32, u32) {
    let day = trading_day(ts);
    (day.year(), day.month())
}

/// Every `(year, month)` from the first date's month to the last's, inclusive.
fn months_between(start: NaiveDate, end: NaiveDate) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());
    while (year, month) <= (end.year(), end.month()) {
        months.push((year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    months
}

/// A handle on a cache directory.
#[derive(Debug, Clone)]
pub struct BarCache {
    root: PathBuf,
}

impl BarCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn month_path(&self, key: &MonthKey) -> PathBuf {
        self.root
            .join(&key.symbol)
            .join(&key.interval)
            .join("months")
            .join(format!("{}.json", key.stem()))
    }

    /// Writes bars into their monthly files, merging with what is already there.
    ///
    /// A bar whose timestamp is already cached replaces the stored one.
    /// Returns the keys of every month that was written, oldest first.
    pub fn store(&self, symbol: &Symbol, interval: &str, bars: &[Bar]) -> Result<Vec<MonthKey>> {
        let mut by_month: BTreeMap<(i32, u32), Vec<&Bar>> = BTreeMap::new();
        for bar in bars {
            by_month.entry(trading_month(bar.open_time)).or_default().push(bar);
        }

        let mut written = Vec::with_capacity(by_month.len());
        for ((year, month), new_bars) in by_month {
            let key = MonthKey::new(symbol, interval, year, month);

            let mut merged: BTreeMap<DateTime<Utc>, Bar> = BTreeMap::new();
            if let Some(existing) = self.load(&key)? {
                merged.extend(existing.into_iter().map(|bar| (bar.open_time, bar)));
            }
            let before = merged.len();
            merged.extend(new_bars.into_iter().map(|bar| (bar.open_time, bar.clone())));

            let file = MonthFile {
                symbol: key.symbol.clone(),
                interval: key.interval.clone(),
                bars: merged.into_values().collect(),
            };
            self.write_atomic(&self.month_path(&key), &file)?;

            tracing::info!(month = %key, rows = file.bars.len(), added = file.bars.len() - before, "Stored month.");
            written.push(key);
        }
        Ok(written)
    }

    /// Reads one month. A month that was never stored is `Ok(None)`.
    pub fn load(&self, key: &MonthKey) -> Result<Option<Vec<Bar>>> {
        let path = self.month_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(Error::Io { path, source }),
        };
        let file: MonthFile = serde_json::from_str(&content).map_err(|source| Error::Corrupt { path, source })?;
        Ok(Some(file.bars))
    }

    /// Loads every bar whose trading day lies in `[start, end]`.
    ///
    /// Months with no file are logged and skipped, so the result may be empty.
    pub fn load_range(&self, symbol: &Symbol, interval: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }

        let mut bars = Vec::new();
        for (year, month) in months_between(start, end) {
            let key = MonthKey::new(symbol, interval, year, month);
            match self.load(&key)? {
                Some(month_bars) => bars.extend(
                    month_bars
                        .into_iter()
                        .filter(|bar| (start..=end).contains(&trading_day(bar.open_time))),
                ),
                None => tracing::warn!(month = %key, "No cached data for month."),
            }
        }

        bars.sort_by_key(|bar| bar.open_time);
        bars.dedup_by_key(|bar| bar.open_time);
        tracing::debug!(symbol = %symbol, interval, %start, %end, rows = bars.len(), "Loaded cached range.");
        Ok(bars)
    }

    fn write_atomic(&self, path: &Path, file: &MonthFile) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| Error::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string(file).map_err(|source| Error::Encode {
            path: path.to_path_buf(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| Error::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Row count, time span and close statistics of a block of bars.
pub fn summarize(bars: &[Bar]) -> CacheSummary {
    if bars.is_empty() {
        return CacheSummary::default();
    }
    let total: Decimal = bars.iter().map(|bar| bar.close).sum();
    CacheSummary {
        rows: bars.len(),
        first: bars.iter().map(|bar| bar.open_time).min(),
        last: bars.iter().map(|bar| bar.open_time).max(),
        min_close: bars.iter().map(|bar| bar.close).min(),
        max_close: bars.iter().map(|bar| bar.close).max(),
        mean_close: Some(total / Decimal::from(bars.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn bar(ts: DateTime<Utc>, close: Decimal) -> Bar {
        Bar {
            open_time: ts,
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(1),
        }
    }

    fn btc() -> Symbol {
        Symbol("BTC".into())
    }

    #[test]
    fn trading_day_starts_at_six_jst() {
        // 20:59 UTC = 05:59 JST next day, still the previous trading day.
        let before = Utc.with_ymd_and_hms(2024, 1, 31, 20, 59, 0).unwrap();
        // 21:00 UTC = 06:00 JST on Feb 1st.
        let at = Utc.with_ymd_and_hms(2024, 1, 31, 21, 0, 0).unwrap();
        assert_eq!(trading_day(before), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert_eq!(trading_day(at), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(trading_month(before), (2024, 1));
        assert_eq!(trading_month(at), (2024, 2));
    }

    #[test]
    fn months_between_crosses_year_end() {
        let months = months_between(
            NaiveDate::from_ymd_opt(2023, 11, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        );
        assert_eq!(months, vec![(2023, 11), (2023, 12), (2024, 1), (2024, 2)]);
    }

    #[test]
    fn store_splits_by_trading_month_and_load_reads_back() {
        let dir = tempdir().unwrap();
        let cache = BarCache::new(dir.path());
        let bars = vec![
            bar(Utc.with_ymd_and_hms(2024, 1, 31, 20, 59, 0).unwrap(), dec!(100)),
            bar(Utc.with_ymd_and_hms(2024, 1, 31, 21, 0, 0).unwrap(), dec!(101)),
        ];

        let keys = cache.store(&btc(), "1min", &bars).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].stem(), "202401");
        assert_eq!(keys[1].stem(), "202402");
        assert!(dir.path().join("BTC/1min/months/202401.json").exists());
        assert!(!dir.path().join("BTC/1min/months/202401.json.tmp").exists());

        let january = cache.load(&keys[0]).unwrap().unwrap();
        assert_eq!(january, vec![bars[0].clone()]);
    }

    #[test]
    fn missing_month_is_none() {
        let dir = tempdir().unwrap();
        let cache = BarCache::new(dir.path());
        let key = MonthKey::new(&btc(), "1min", 2020, 5);
        assert!(cache.load(&key).unwrap().is_none());
    }

    #[test]
    fn month_outside_the_calendar_is_rejected() {
        assert!(MonthKey::checked(&btc(), "1min", 2024, 12).is_ok());
        let err = MonthKey::checked(&btc(), "1min", 2024, 13).unwrap_err();
        assert!(matches!(err, Error::InvalidMonth { month: 13 }));
    }

    #[test]
    fn corrupt_month_is_an_error() {
        let dir = tempdir().unwrap();
        let cache = BarCache::new(dir.path());
        let key = MonthKey::new(&btc(), "1min", 2024, 3);
        let path = cache.month_path(&key);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        assert!(matches!(cache.load(&key).unwrap_err(), Error::Corrupt { .. }));
    }

    #[test]
    fn store_merges_and_newer_bars_win() {
        let dir = tempdir().unwrap();
        let cache = BarCache::new(dir.path());
        let t0 = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let t1 = t0 + TimeDelta::minutes(1);
        let t2 = t0 + TimeDelta::minutes(2);

        cache.store(&btc(), "1min", &[bar(t0, dec!(1)), bar(t1, dec!(2))]).unwrap();
        cache.store(&btc(), "1min", &[bar(t2, dec!(3)), bar(t1, dec!(20))]).unwrap();

        let key = MonthKey::new(&btc(), "1min", 2024, 3);
        let closes: Vec<_> = cache.load(&key).unwrap().unwrap().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![dec!(1), dec!(20), dec!(3)]);
    }

    #[test]
    fn load_range_keeps_only_requested_trading_days() {
        let dir = tempdir().unwrap();
        let cache = BarCache::new(dir.path());
        // 00:00 UTC is 09:00 JST, well inside each calendar day's trading day.
        let start = Utc.with_ymd_and_hms(2024, 2, 27, 0, 0, 0).unwrap();
        let bars: Vec<_> = (0..5)
            .map(|d| bar(start + TimeDelta::days(d), Decimal::from(d)))
            .collect();
        cache.store(&btc(), "1min", &bars).unwrap();

        let loaded = cache
            .load_range(
                &btc(),
                "1min",
                NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            )
            .unwrap();
        let days: Vec<_> = loaded.iter().map(|b| trading_day(b.open_time)).collect();
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ]
        );
    }

    #[test]
    fn load_range_with_no_files_is_empty_and_reversed_range_fails() {
        let dir = tempdir().unwrap();
        let cache = BarCache::new(dir.path());
        let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let feb = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(cache.load_range(&btc(), "1min", jan, feb).unwrap().is_empty());

        let err = cache.load_range(&btc(), "1min", feb, jan).unwrap_err();
        assert_eq!(err.kind(), core_types::ErrorKind::Configuration);
    }

    #[test]
    fn summarize_reports_span_and_close_stats() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let bars = vec![
            bar(t0, dec!(10)),
            bar(t0 + TimeDelta::minutes(1), dec!(14)),
            bar(t0 + TimeDelta::minutes(2), dec!(12)),
        ];
        let summary = summarize(&bars);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.first, Some(t0));
        assert_eq!(summary.last, Some(t0 + TimeDelta::minutes(2)));
        assert_eq!(summary.min_close, Some(dec!(10)));
        assert_eq!(summary.max_close, Some(dec!(14)));
        assert_eq!(summary.mean_close, Some(dec!(12)));

        assert_eq!(summarize(&[]), CacheSummary::default());
    }
}
