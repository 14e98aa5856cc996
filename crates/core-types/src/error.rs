// In crates/core-types/src/error.rs

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The failure categories shared by every crate in the workspace.
///
/// Each crate-level `Error` maps itself onto one of these through a `kind()`
/// method so callers can react to the category without matching on every
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A run was configured with parameters that can never produce a valid simulation.
    Configuration,
    /// The price data itself is unusable (e.g. a non-positive close).
    DataQuality,
    /// Two sequences that must share the bar index do not.
    InputAlignment,
    /// Anything outside the core (network, disk, parsing).
    External,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("bar {index} at {current} does not come after the previous bar at {previous}")]
    UnorderedTimestamps {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnorderedTimestamps { .. } => ErrorKind::InputAlignment,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
