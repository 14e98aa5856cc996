// In crates/api-client/src/error.rs

use chrono::NaiveDate;
use core_types::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the API client: {0}")]
    ClientBuildError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("API error: status {status}, code {code}, msg: {msg}")]
    ApiError { status: i64, code: String, msg: String },
    #[error("Invalid {field} value in kline: {value:?}")]
    InvalidField { field: &'static str, value: String },
    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("No klines were returned for {symbol} between {start} and {end}")]
    NoData { symbol: String, start: NaiveDate, end: NaiveDate },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::External
    }
}

pub type Result<T> = std::result::Result<T, Error>;
