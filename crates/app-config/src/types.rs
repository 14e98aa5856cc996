// In crates/app-config/src/types.rs

use rust_decimal::Decimal;
use serde::Deserialize;
use strategies::types::MACrossoverSettings;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the GMO Coin public API.
    pub gmo: GmoSettings,
    /// Where fetched bars are kept on disk.
    pub cache: CacheSettings,
    pub backtest: BacktestSettings,
    #[serde(default)]
    pub strategies: StrategySettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,

    pub optimizer_cores: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GmoSettings {
    /// The public REST base URL, e.g. `https://api.coin.z.com/public/v1`.
    pub rest_base_url: String,
    /// Pause between day requests. The client never goes below 1000.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CacheSettings {
    pub root_dir: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BacktestSettings {
    pub initial_balance: Decimal,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct StrategySettings {
    pub ma_crossover: Option<MACrossoverSettings>,
}

fn default_request_delay_ms() -> u64 { 1000 }
fn default_timeout_secs() -> u64 { 30 }
