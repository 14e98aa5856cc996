// In crates/bar-cache/src/error.rs

use chrono::NaiveDate;
use core_types::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Month file {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode month file {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Month {month} is out of range (1-12)")]
    InvalidMonth { month: u32 },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidRange { .. } | Error::InvalidMonth { .. } => ErrorKind::Configuration,
            Error::Io { .. } | Error::Corrupt { .. } | Error::Encode { .. } => ErrorKind::External,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
