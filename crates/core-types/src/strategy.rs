use serde::Deserialize;
use toml::Value;

/// A strategy selected by name, with its parameters kept as a raw TOML table.
#[derive(Deserialize, Debug, Clone)]
pub struct StrategyConfig {
    pub name: String,
    // This will hold the `params = { ... }` table from the TOML
    pub params: Value,
}
