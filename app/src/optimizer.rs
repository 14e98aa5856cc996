// In app/src/optimizer.rs

use analytics::PerformanceReport;
use anyhow::{Context, Result};
use app_config::types::AppSettings;
use backtester::Backtester;
use chrono::NaiveDate;
use core_types::{BarSeries, StrategyConfig, Symbol};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use strategies::factory::create_strategy;
use toml::Value;

// --- Structs for deserializing optimizer.toml ---

#[derive(Deserialize, Debug)]
pub struct OptimizerConfig {
    pub job: JobSettings,

    // Every other top-level table, keyed by name (e.g. "ma_crossover_params").
    #[serde(flatten)]
    pub strategy_params: HashMap<String, Value>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct JobSettings {
    pub name: String,
    pub symbol: String,
    pub interval: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub strategy_to_optimize: String,
    /// Runs with fewer completed round trips are left out of the ranking.
    #[serde(default = "default_min_trades")]
    pub min_trades: u32,
    /// Overrides `backtest.initial_balance` from the main settings.
    pub initial_balance: Option<Decimal>,
}

fn default_min_trades() -> u32 { 1 }

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(untagged)] // Allows serde to try parsing as one variant, then the next
enum ParamValue {
    Fixed(i64),
    Range { start: i64, end: i64, step: Option<i64> },
}

impl ParamValue {
    /// Every value the parameter takes, `end` inclusive.
    fn expand(self) -> Result<Vec<i64>> {
        match self {
            ParamValue::Fixed(v) => Ok(vec![v]),
            ParamValue::Range { start, end, step } => {
                let step = step.unwrap_or(1);
                anyhow::ensure!(step > 0, "Range step must be positive, got {}", step);
                anyhow::ensure!(start <= end, "Range start {} is after end {}", start, end);
                let step = usize::try_from(step).context("Range step is too large")?;
                Ok((start..=end).step_by(step).collect())
            }
        }
    }
}

/// One finished backtest of the sweep.
#[derive(Debug, Clone)]
pub struct OptimizationRun {
    pub params: Value,
    pub report: PerformanceReport,
}

// --- Public API for the Optimizer Module ---

pub fn load_optimizer_config() -> Result<OptimizerConfig> {
    let content = fs::read_to_string("config/optimizer.toml").context("Failed to read config/optimizer.toml")?;
    parse_optimizer_config(&content)
}

pub fn parse_optimizer_config(content: &str) -> Result<OptimizerConfig> {
    toml::from_str(content).context("Failed to parse optimizer.toml")
}

/// Expands the job's parameter table into the full grid of strategy configs.
///
/// Combinations the strategy itself rejects (e.g. a short window that is not
/// shorter than the mid window) are dropped here.
pub fn generate_parameter_sets(config: &OptimizerConfig) -> Result<Vec<StrategyConfig>> {
    let strategy_name = &config.job.strategy_to_optimize;
    let strategy_key = format!("{}_params", strategy_name);

    let params_table = config
        .strategy_params
        .get(&strategy_key)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Parameter table '{}' not found in optimizer.toml. Available tables are: {:?}",
                strategy_key,
                config.strategy_params.keys()
            )
        })?
        .as_table()
        .ok_or_else(|| anyhow::anyhow!("'{}' must be a TOML table.", strategy_key))?;

    // Build all combinations, one key at a time.
    let mut grid: Vec<toml::map::Map<String, Value>> = vec![toml::map::Map::new()];
    for (key, raw) in params_table {
        let param: ParamValue = raw
            .clone()
            .try_into()
            .with_context(|| format!("Invalid value for parameter '{}'", key))?;
        let values = param
            .expand()
            .with_context(|| format!("Invalid range for parameter '{}'", key))?;

        grid = grid
            .into_iter()
            .flat_map(|table| {
                values.iter().map(move |v| {
                    let mut next = table.clone();
                    next.insert(key.clone(), Value::Integer(*v));
                    next
                })
            })
            .collect();
    }

    let total = grid.len();
    let sets: Vec<StrategyConfig> = grid
        .into_iter()
        .map(|table| StrategyConfig {
            name: strategy_name.clone(),
            params: Value::Table(table),
        })
        .filter(|candidate| match create_strategy(candidate) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(params = %candidate.params, error = %e, "Skipping invalid parameter set.");
                false
            }
        })
        .collect();

    tracing::info!(total, valid = sets.len(), "Generated parameter grid.");
    Ok(sets)
}

/// The main parallel engine for running an optimization job.
///
/// Every run shares the same bar series; failed runs are logged and left out.
pub fn run_optimization(
    app_settings: &AppSettings,
    job_settings: &JobSettings,
    series: &BarSeries,
    initial_balance: Decimal,
    param_sets: &[StrategyConfig],
) -> Result<Vec<OptimizationRun>> {
    tracing::info!(cores = app_settings.optimizer_cores, "Configuring Rayon thread pool.");
    let pool = ThreadPoolBuilder::new()
        .num_threads(app_settings.optimizer_cores as usize)
        .build()
        .context("Failed to build Rayon thread pool")?;

    let symbol = Symbol(job_settings.symbol.clone());
    let runs = pool.install(|| {
        param_sets
            .par_iter()
            .filter_map(|config| {
                match run_single_backtest(&symbol, &job_settings.interval, series, initial_balance, config) {
                    Ok(run) => Some(run),
                    Err(e) => {
                        tracing::error!(params = %config.params, error = %e, "A single backtest run failed.");
                        None
                    }
                }
            })
            .collect::<Vec<_>>()
    });

    tracing::info!(requested = param_sets.len(), completed = runs.len(), "Optimization runs finished.");
    Ok(runs)
}

fn run_single_backtest(
    symbol: &Symbol,
    interval: &str,
    series: &BarSeries,
    initial_balance: Decimal,
    config: &StrategyConfig,
) -> Result<OptimizationRun> {
    let strategy = create_strategy(config)?;
    let backtester = Backtester::new(symbol.clone(), interval.to_string(), strategy, initial_balance);
    let (report, _) = backtester.run(series)?;
    Ok(OptimizationRun {
        params: config.params.clone(),
        report,
    })
}
