// In crates/api-client/src/types.rs

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// The client for the GMO Coin public market-data API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The persistent HTTP client.
    pub http_client: Client,
    /// The public REST base URL, up to and including the version segment.
    pub base_url: String,
    /// Pause between consecutive requests of a range fetch.
    pub request_delay: Duration,
}

/// The envelope every public endpoint responds with.
///
/// `status` is 0 on success; otherwise `messages` explains the failure and
/// `data` is absent.
#[derive(Debug, Deserialize)]
pub struct KlinesResponse {
    pub status: i64,
    #[serde(default)]
    pub data: Option<Vec<RawKline>>,
    #[serde(default)]
    pub messages: Option<Vec<ApiMessage>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiMessage {
    pub message_code: String,
    pub message_string: String,
}

/// A kline exactly as the API sends it: every field is a string, and
/// `openTime` is epoch milliseconds.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawKline {
    pub open_time: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}
