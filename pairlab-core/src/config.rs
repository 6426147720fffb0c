//! Strategy parameters passed into the orchestrator at call time.

use serde::{Deserialize, Serialize};

use crate::domain::LegDirection;
use crate::error::CoreError;
use crate::signal::StdDevMode;

/// Parameters of one pair backtest.
///
/// Defaults match the reference tool: threshold 1.5, one unit per leg held
/// in the same direction, 1000 starting capital, sample deviation, no
/// close-out at end of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairConfig {
    /// Entry/exit sensitivity in standard deviations.
    pub z_threshold: f64,
    /// Units of instrument A per position.
    pub unit_size_a: f64,
    /// Units of instrument B per position.
    pub unit_size_b: f64,
    pub starting_capital: f64,
    /// Close any open position on the last row instead of leaving it open.
    pub close_on_end: bool,
    pub leg_b_direction: LegDirection,
    pub std_dev_mode: StdDevMode,
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            z_threshold: 1.5,
            unit_size_a: 1.0,
            unit_size_b: 1.0,
            starting_capital: 1000.0,
            close_on_end: false,
            leg_b_direction: LegDirection::default(),
            std_dev_mode: StdDevMode::default(),
        }
    }
}

impl PairConfig {
    pub fn with_threshold(mut self, z_threshold: f64) -> Self {
        self.z_threshold = z_threshold;
        self
    }

    /// Reject non-positive thresholds, negative sizes and non-finite values.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.z_threshold.is_finite() && self.z_threshold > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "z_threshold must be positive and finite, got {}",
                self.z_threshold
            )));
        }
        for (name, size) in [
            ("unit_size_a", self.unit_size_a),
            ("unit_size_b", self.unit_size_b),
        ] {
            if !(size.is_finite() && size >= 0.0) {
                return Err(CoreError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {size}"
                )));
            }
        }
        if !self.starting_capital.is_finite() {
            return Err(CoreError::InvalidConfig(format!(
                "starting_capital must be finite, got {}",
                self.starting_capital
            )));
        }
        Ok(())
    }
}
