//! Serializable backtest configuration (TOML).
//!
//! ```toml
//! [pair]
//! symbol_a = "BTC-USDT-SWAP"
//! symbol_b = "ETH-USDT-SWAP"
//! data_dir_a = "data/btc_usdt_swap"
//! data_dir_b = "data/eth_usdt_swap"
//!
//! [strategy]
//! z_threshold = 1.5
//! unit_size_a = 1.0
//! unit_size_b = 1.0
//! leg_b_direction = "same"
//! std_dev_mode = "sample"
//!
//! [backtest]
//! starting_capital = 1000.0
//! close_on_end = false
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use pairlab_core::domain::LegDirection;
use pairlab_core::signal::StdDevMode;
use pairlab_core::PairConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config TOML: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Unique identifier for a backtest configuration (content hash).
pub type RunId = String;

/// The two instruments and where their bars live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairSection {
    pub symbol_a: String,
    pub symbol_b: String,
    pub data_dir_a: Option<PathBuf>,
    pub data_dir_b: Option<PathBuf>,
}

impl Default for PairSection {
    fn default() -> Self {
        Self {
            symbol_a: "BTC-USDT-SWAP".into(),
            symbol_b: "ETH-USDT-SWAP".into(),
            data_dir_a: None,
            data_dir_b: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySection {
    pub z_threshold: f64,
    pub unit_size_a: f64,
    pub unit_size_b: f64,
    pub leg_b_direction: LegDirection,
    pub std_dev_mode: StdDevMode,
}

impl Default for StrategySection {
    fn default() -> Self {
        let core = PairConfig::default();
        Self {
            z_threshold: core.z_threshold,
            unit_size_a: core.unit_size_a,
            unit_size_b: core.unit_size_b,
            leg_b_direction: core.leg_b_direction,
            std_dev_mode: core.std_dev_mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub starting_capital: f64,
    pub close_on_end: bool,
}

impl Default for BacktestSection {
    fn default() -> Self {
        let core = PairConfig::default();
        Self {
            starting_capital: core.starting_capital,
            close_on_end: core.close_on_end,
        }
    }
}

/// Full configuration of a single pair backtest run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub pair: PairSection,
    pub strategy: StrategySection,
    pub backtest: BacktestSection,
}

impl BacktestConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Strategy parameters for the core orchestrator.
    pub fn to_pair_config(&self) -> PairConfig {
        PairConfig {
            z_threshold: self.strategy.z_threshold,
            unit_size_a: self.strategy.unit_size_a,
            unit_size_b: self.strategy.unit_size_b,
            starting_capital: self.backtest.starting_capital,
            close_on_end: self.backtest.close_on_end,
            leg_b_direction: self.strategy.leg_b_direction,
            std_dev_mode: self.strategy.std_dev_mode,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pair.symbol_a.trim().is_empty() || self.pair.symbol_b.trim().is_empty() {
            return Err(ConfigError::Invalid("both pair symbols must be set".into()));
        }
        if self.pair.symbol_a == self.pair.symbol_b {
            return Err(ConfigError::Invalid(format!(
                "pair symbols must differ, got '{}' twice",
                self.pair.symbol_a
            )));
        }
        self.to_pair_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Deterministic hash of every parameter that affects the result.
    ///
    /// Data folders are excluded: the dataset is fingerprinted separately.
    pub fn run_id(&self) -> RunId {
        let pair = self.to_pair_config();
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.pair.symbol_a.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.pair.symbol_b.as_bytes());
        hasher.update(b"\0");
        hasher.update(&pair.z_threshold.to_le_bytes());
        hasher.update(&pair.unit_size_a.to_le_bytes());
        hasher.update(&pair.unit_size_b.to_le_bytes());
        hasher.update(&pair.starting_capital.to_le_bytes());
        hasher.update(&[
            pair.close_on_end as u8,
            (pair.leg_b_direction == LegDirection::Same) as u8,
            (pair.std_dev_mode == StdDevMode::Population) as u8,
        ]);
        hasher.finalize().to_hex().to_string()
    }
}
