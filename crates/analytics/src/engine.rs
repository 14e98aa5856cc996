// In crates/analytics/src/engine.rs

use crate::types::{PerformanceReport, RoundTrip};
use core_types::{Action, TradeRecord};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

/// The engine responsible for calculating performance metrics from a trade ledger.
#[derive(Default)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs each Buy with the next Sell. A trailing unmatched Buy is ignored.
    pub fn round_trips(&self, ledger: &[TradeRecord]) -> Vec<RoundTrip> {
        let mut trips = Vec::new();
        let mut open: Option<&TradeRecord> = None;

        for record in ledger {
            match (record.action, open) {
                (Action::Buy, None) => open = Some(record),
                (Action::Sell, Some(entry)) => {
                    let return_pct = if entry.price > dec!(0) {
                        ((record.price - entry.price) / entry.price).to_f64().unwrap_or(0.0) * 100.0
                    } else {
                        0.0
                    };
                    trips.push(RoundTrip {
                        entry_time: entry.timestamp,
                        exit_time: record.timestamp,
                        entry_price: entry.price,
                        exit_price: record.price,
                        return_pct,
                    });
                    open = None;
                }
                // A well-formed ledger alternates; anything else is skipped.
                _ => {}
            }
        }
        trips
    }

    /// Calculates a performance report from the balances and the ledger of a run.
    pub fn calculate(
        &self,
        initial_balance: Decimal,
        final_balance: Decimal,
        ledger: &[TradeRecord],
    ) -> PerformanceReport {
        let mut report = PerformanceReport::new();
        report.initial_balance = initial_balance;
        report.final_balance = final_balance;
        report.net_pnl_absolute = final_balance - initial_balance;
        if initial_balance > dec!(0) {
            report.net_pnl_percentage = (report.net_pnl_absolute / initial_balance)
                .to_f64()
                .unwrap_or(0.0)
                * 100.0;
        }

        let trips = self.round_trips(ledger);
        if trips.is_empty() {
            return report;
        }

        report.total_trades = trips.len() as u32;
        report.winning_trades = trips.iter().filter(|t| t.exit_price > t.entry_price).count() as u32;
        report.win_rate = (report.winning_trades as f64 / report.total_trades as f64) * 100.0;
        report.best_trade_pct = trips.iter().map(|t| t.return_pct).fold(f64::MIN, f64::max);
        report.worst_trade_pct = trips.iter().map(|t| t.return_pct).fold(f64::MAX, f64::min);

        // The whole balance rides every trade, so the realised curve compounds trade by trade.
        let mut balance = initial_balance;
        let mut peak = initial_balance;
        let mut max_drawdown = 0.0_f64;
        for trip in &trips {
            if trip.entry_price <= dec!(0) {
                continue;
            }
            balance = balance
                .checked_mul(trip.exit_price)
                .and_then(|v| v.checked_div(trip.entry_price))
                .unwrap_or(balance);
            peak = peak.max(balance);
            if peak > dec!(0) {
                let drawdown = ((peak - balance) / peak).to_f64().unwrap_or(0.0) * 100.0;
                max_drawdown = max_drawdown.max(drawdown);
            }
        }
        report.max_drawdown_percentage = max_drawdown;

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn record(action: Action, price: Decimal, minute: i64) -> TradeRecord {
        TradeRecord {
            action,
            price,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute),
        }
    }

    #[test]
    fn empty_ledger_reports_only_balances() {
        let report = AnalyticsEngine::new().calculate(dec!(1000), dec!(1000), &[]);
        assert_eq!(report.total_trades, 0);
        assert_eq!(report.net_pnl_absolute, dec!(0));
        assert_eq!(report.win_rate, 0.0);
    }

    #[test]
    fn pairs_buys_with_following_sells() {
        let ledger = vec![
            record(Action::Buy, dec!(100), 0),
            record(Action::Sell, dec!(110), 5),
            record(Action::Buy, dec!(120), 9),
            record(Action::Sell, dec!(108), 12),
        ];
        let trips = AnalyticsEngine::new().round_trips(&ledger);
        assert_eq!(trips.len(), 2);
        assert!((trips[0].return_pct - 10.0).abs() < 1e-9);
        assert!((trips[1].return_pct + 10.0).abs() < 1e-9);
    }

    #[test]
    fn report_counts_wins_and_drawdown() {
        let ledger = vec![
            record(Action::Buy, dec!(100), 0),
            record(Action::Sell, dec!(110), 5),
            record(Action::Buy, dec!(120), 9),
            record(Action::Sell, dec!(108), 12),
        ];
        // 1000 -> 1100 -> 990
        let report = AnalyticsEngine::new().calculate(dec!(1000), dec!(990), &ledger);
        assert_eq!(report.total_trades, 2);
        assert_eq!(report.winning_trades, 1);
        assert!((report.win_rate - 50.0).abs() < 1e-9);
        assert!((report.net_pnl_percentage + 1.0).abs() < 1e-9);
        assert!((report.max_drawdown_percentage - 10.0).abs() < 1e-9);
        assert!((report.best_trade_pct - 10.0).abs() < 1e-9);
        assert!((report.worst_trade_pct + 10.0).abs() < 1e-9);
    }

    #[test]
    fn unmatched_trailing_buy_is_ignored() {
        let ledger = vec![record(Action::Buy, dec!(100), 0)];
        assert!(AnalyticsEngine::new().round_trips(&ledger).is_empty());
    }
}
