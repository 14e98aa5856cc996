// In crates/strategies/src/error.rs

use core_types::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{name} window must be at least 1 bar")]
    ZeroWindow { name: &'static str },

    #[error("short window ({short}) must be smaller than mid window ({mid})")]
    WindowOrder { short: usize, mid: usize },

    #[error("{name} rolling mean does not fit in a decimal at bar {index}")]
    MeanOverflow { name: &'static str, index: usize },

    #[error("moving-average lengths differ: short has {short} values, mid has {mid}")]
    LengthMismatch { short: usize, mid: usize },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ZeroWindow { .. } | Error::WindowOrder { .. } => ErrorKind::Configuration,
            Error::LengthMismatch { .. } => ErrorKind::InputAlignment,
            Error::MeanOverflow { .. } => ErrorKind::DataQuality,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
