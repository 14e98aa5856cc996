// In crates/strategies/src/factory.rs

use crate::Strategy;
use crate::ma_crossover::MACrossover;
use crate::types::MACrossoverSettings;
use anyhow::Result;
use core_types::StrategyConfig;

/// Instantiates a strategy from its name and raw TOML parameters.
pub fn create_strategy(config: &StrategyConfig) -> Result<Box<dyn Strategy + Send + Sync>> {
    let strategy_instance: Box<dyn Strategy + Send + Sync> = match config.name.as_str() {
        "ma_crossover" => {
            let settings: MACrossoverSettings = config.params.clone().try_into()?;
            Box::new(MACrossover::new(settings)?)
        }
        unknown => anyhow::bail!("Attempted to create unknown strategy: {}", unknown),
    };
    Ok(strategy_instance)
}
