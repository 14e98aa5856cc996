// In crates/backtester/src/ledger.rs

use core_types::TradeRecord;

/// An append-only record of every executed action in a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeLedger {
    records: Vec<TradeRecord>,
}

impl TradeLedger {
    /// Creates a new, empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record. Records must arrive in simulation order.
    pub fn record(&mut self, record: TradeRecord) {
        tracing::debug!(
            action = %record.action,
            price = %record.price,
            time = %record.timestamp,
            "Trade recorded."
        );
        self.records.push(record);
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&TradeRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<TradeRecord> {
        self.records
    }
}
