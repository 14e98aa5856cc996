// In crates/api-client/src/lib.rs

use app_config::types::GmoSettings;
use chrono::{DateTime, NaiveDate, Utc};
use core_types::{Bar, Symbol};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::sleep;

pub mod error;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use types::*;

/// The public API throttles aggressively; never go faster than one request a second.
pub const MIN_REQUEST_DELAY: Duration = Duration::from_millis(1000);

impl ApiClient {
    /// Constructs a new ApiClient from GmoSettings.
    pub fn new(settings: &GmoSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;
        let request_delay = Duration::from_millis(settings.request_delay_ms).max(MIN_REQUEST_DELAY);

        Ok(ApiClient {
            http_client,
            base_url: settings.rest_base_url.trim_end_matches('/').to_string(),
            request_delay,
        })
    }

    /// Builds the klines URL for one trading day.
    pub fn klines_url(&self, symbol: &Symbol, interval: &str, date: NaiveDate) -> String {
        format!(
            "{}/klines?symbol={}&interval={}&date={}",
            self.base_url,
            symbol.0,
            interval,
            date.format("%Y%m%d")
        )
    }

    /// Fetches the klines of a single trading day.
    ///
    /// This corresponds to the `GET /v1/klines` endpoint. The exchange's day
    /// runs from 06:00 JST to 05:59 JST the next morning.
    pub async fn get_klines(&self, symbol: &Symbol, interval: &str, date: NaiveDate) -> Result<Vec<Bar>> {
        let url = self.klines_url(symbol, interval, date);

        let response_body = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(Error::RequestFailed)?
            .error_for_status()
            .map_err(Error::RequestFailed)?
            .text()
            .await
            .map_err(Error::RequestFailed)?;

        parse_klines_response(&response_body)
    }

    /// Fetches every day in `[start, end]`, one request per day.
    ///
    /// This is best-effort: a day that fails or comes back empty is logged and
    /// skipped. Only a range that yields no bars at all is an error.
    pub async fn fetch_range(
        &self,
        symbol: &Symbol,
        interval: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }

        let total_days = (end - start).num_days() + 1;
        tracing::info!(symbol = %symbol, interval, %start, %end, total_days, "Fetching klines day by day.");

        let mut bars: Vec<Bar> = Vec::new();
        for (n, date) in start.iter_days().take_while(|d| *d <= end).enumerate() {
            if n > 0 {
                sleep(self.request_delay).await;
            }

            match self.get_klines(symbol, interval, date).await {
                Ok(day) if day.is_empty() => {
                    tracing::info!(%date, "No klines for this day.");
                }
                Ok(day) => {
                    tracing::info!(%date, count = day.len(), progress = n + 1, total_days, "Fetched klines.");
                    bars.extend(day);
                }
                Err(e) => {
                    tracing::warn!(%date, error = %e, "Failed to fetch klines. Skipping day.");
                }
            }
        }

        if bars.is_empty() {
            return Err(Error::NoData {
                symbol: symbol.0.clone(),
                start,
                end,
            });
        }

        bars.sort_by_key(|bar| bar.open_time);
        bars.dedup_by_key(|bar| bar.open_time);
        Ok(bars)
    }
}

// Free function to allow api_client::new usage
pub fn new(settings: &GmoSettings) -> Result<ApiClient> {
    ApiClient::new(settings)
}

/// Decodes a klines response body into bars.
///
/// A non-zero status becomes `Error::ApiError`. Numeric fields are parsed
/// strictly; a malformed value is an error rather than a silent zero.
pub fn parse_klines_response(body: &str) -> Result<Vec<Bar>> {
    let response: KlinesResponse = serde_json::from_str(body).map_err(Error::DeserializationFailed)?;

    if response.status != 0 {
        let first = response.messages.as_deref().and_then(|m| m.first());
        return Err(Error::ApiError {
            status: response.status,
            code: first.map(|m| m.message_code.clone()).unwrap_or_default(),
            msg: first
                .map(|m| m.message_string.clone())
                .unwrap_or_else(|| "Unknown error".to_string()),
        });
    }

    response
        .data
        .unwrap_or_default()
        .iter()
        .map(RawKline::to_bar)
        .collect()
}

impl RawKline {
    /// Converts the raw string fields into our clean, internal Bar type.
    pub fn to_bar(&self) -> Result<Bar> {
        let millis: i64 = self.open_time.parse().map_err(|_| Error::InvalidField {
            field: "openTime",
            value: self.open_time.clone(),
        })?;
        let open_time = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| Error::InvalidField {
            field: "openTime",
            value: self.open_time.clone(),
        })?;

        Ok(Bar {
            open_time,
            open: parse_decimal("open", &self.open)?,
            high: parse_decimal("high", &self.high)?,
            low: parse_decimal("low", &self.low)?,
            close: parse_decimal("close", &self.close)?,
            volume: parse_decimal("volume", &self.volume)?,
        })
    }
}

fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value).map_err(|_| Error::InvalidField {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn settings(base: &str, delay_ms: u64) -> GmoSettings {
        GmoSettings {
            rest_base_url: base.to_string(),
            request_delay_ms: delay_ms,
            timeout_secs: 5,
        }
    }

    #[test]
    fn builds_one_day_klines_url() {
        let client = ApiClient::new(&settings("https://api.coin.z.com/public/v1/", 1000)).unwrap();
        let url = client.klines_url(
            &Symbol("BTC".into()),
            "1min",
            NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
        );
        assert_eq!(url, "https://api.coin.z.com/public/v1/klines?symbol=BTC&interval=1min&date=20250320");
    }

    #[test]
    fn request_delay_never_drops_below_one_second() {
        let client = ApiClient::new(&settings("http://localhost", 10)).unwrap();
        assert_eq!(client.request_delay, MIN_REQUEST_DELAY);
        let client = ApiClient::new(&settings("http://localhost", 2500)).unwrap();
        assert_eq!(client.request_delay, Duration::from_millis(2500));
    }

    #[test]
    fn parses_successful_response() {
        let body = r#"{
            "status": 0,
            "data": [
                {"openTime":"1742421600000","open":"12650000","high":"12660000","low":"12645000","close":"12655000","volume":"0.8731"},
                {"openTime":"1742421660000","open":"12655000","high":"12655000","low":"12640000","close":"12641000","volume":"1.02"}
            ],
            "responsetime": "2025-03-20T00:00:00.000Z"
        }"#;
        let bars = parse_klines_response(body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].open_time, Utc.with_ymd_and_hms(2025, 3, 19, 22, 0, 0).unwrap());
        assert_eq!(bars[0].close, dec!(12655000));
        assert_eq!(bars[1].volume, dec!(1.02));
    }

    #[test]
    fn empty_data_is_an_empty_day() {
        let bars = parse_klines_response(r#"{"status":0,"data":[],"responsetime":"x"}"#).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn non_zero_status_is_an_api_error() {
        let body = r#"{"status":5,"messages":[{"message_code":"ERR-5201","message_string":"MAINTENANCE."}],"responsetime":"x"}"#;
        match parse_klines_response(body).unwrap_err() {
            Error::ApiError { status, code, msg } => {
                assert_eq!(status, 5);
                assert_eq!(code, "ERR-5201");
                assert_eq!(msg, "MAINTENANCE.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_price_is_rejected_not_zeroed() {
        let body = r#"{"status":0,"data":[{"openTime":"1742421600000","open":"x","high":"1","low":"1","close":"1","volume":"1"}]}"#;
        assert!(matches!(
            parse_klines_response(body).unwrap_err(),
            Error::InvalidField { field: "open", .. }
        ));
    }

    #[tokio::test]
    async fn failed_days_are_skipped_and_an_empty_range_is_no_data() {
        // Nothing listens on the discard port, so every request fails.
        let client = ApiClient::new(&settings("http://127.0.0.1:9/public/v1", 1000)).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = client.fetch_range(&Symbol("BTC".into()), "1min", day, day).await.unwrap_err();
        assert!(matches!(err, Error::NoData { .. }));
    }

    #[tokio::test]
    async fn reversed_range_is_rejected() {
        let client = ApiClient::new(&settings("http://127.0.0.1:9", 1000)).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = client.fetch_range(&Symbol("BTC".into()), "1min", start, end).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
    }
}
