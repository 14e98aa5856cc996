// In crates/analytics/src/types.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A Buy matched with the Sell that closed it.
#[derive(Debug, Clone, Serialize)]
pub struct RoundTrip {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    /// Percentage change from entry to exit (e.g. 2.5 for +2.5%).
    pub return_pct: f64,
}

/// A summary of a finished backtest.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PerformanceReport {
    pub initial_balance: Decimal,
    pub final_balance: Decimal,
    pub net_pnl_absolute: Decimal,
    pub net_pnl_percentage: f64,
    /// Completed Buy/Sell round trips.
    pub total_trades: u32,
    pub winning_trades: u32,
    pub win_rate: f64,
    pub best_trade_pct: f64,
    pub worst_trade_pct: f64,
    /// Largest peak-to-trough fall of the realised balance, in percent.
    pub max_drawdown_percentage: f64,
}

impl PerformanceReport {
    /// Creates a new, empty report with default zero values.
    pub fn new() -> Self {
        Self::default()
    }
}
