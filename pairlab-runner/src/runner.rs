//! Backtest runner: wires together config, data loading, the core engine
//! and the performance summary.
//!
//! Two entry points:
//! - `run_from_config()`: loads the pair from disk (or synthetic), then runs. Used by CLI.
//! - `run_loaded()`: takes a pre-loaded pair. Used by tests and callers that load data themselves.

use chrono::{DateTime, Utc};
use pairlab_core::{run_backtest, BacktestResult, CoreError, PairConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_pair, LoadError, LoadOptions, LoadedPair};
use crate::metrics::PerformanceSummary;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("backtest error: {0}")]
    Backtest(#[from] CoreError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete, persistable record of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub symbol_a: String,
    pub symbol_b: String,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub config: PairConfig,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub summary: PerformanceSummary,
    pub result: BacktestResult,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load the configured pair and run the backtest.
pub fn run_from_config(config: &BacktestConfig, opts: &LoadOptions) -> Result<RunReport, RunError> {
    config.validate()?;
    let loaded = load_pair(&config.pair, opts)?;
    run_loaded(config, &loaded)
}

/// Run a backtest on a pre-loaded pair: no I/O.
pub fn run_loaded(config: &BacktestConfig, loaded: &LoadedPair) -> Result<RunReport, RunError> {
    let pair_config = config.to_pair_config();
    let result = run_backtest(&loaded.series_a, &loaded.series_b, &pair_config)?;
    let summary = PerformanceSummary::compute(&result);

    let start = result.annotated_table.first().map(|r| r.timestamp);
    let end = result.annotated_table.last().map(|r| r.timestamp);

    info!(
        run_id = %config.run_id(),
        net_profit = summary.net_profit,
        exits = summary.exits,
        "run finished"
    );

    Ok(RunReport {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        symbol_a: loaded.series_a.symbol.clone(),
        symbol_b: loaded.series_b.symbol.clone(),
        dataset_hash: loaded.dataset_hash.clone(),
        has_synthetic: loaded.has_synthetic,
        config: pair_config,
        start,
        end,
        summary,
        result,
    })
}
