// In crates/core-types/src/lib.rs

pub mod error;
pub mod series;
pub mod strategy;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use error::{Error, ErrorKind, Result};
pub use series::BarSeries;
pub use strategy::StrategyConfig;
pub use types::{Action, Bar, Position, Signal, Symbol, TradeRecord};
