//! Simulator position state.

use serde::{Deserialize, Serialize};

/// Which side of the spread is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSide {
    #[default]
    Flat,
    /// Long the spread: leg A is bought.
    Long,
    /// Short the spread: leg A is sold.
    Short,
}

impl PositionSide {
    /// Direction of leg A: +1 long, -1 short, 0 flat.
    pub fn sign(self) -> f64 {
        match self {
            PositionSide::Flat => 0.0,
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }

    pub fn is_flat(self) -> bool {
        self == PositionSide::Flat
    }
}

/// Direction of leg B relative to leg A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegDirection {
    /// Hedged pair: leg B is held against leg A (long A / short B).
    Opposite,
    /// Both legs held in the same direction, as the reference tool trades them.
    #[default]
    Same,
}

impl LegDirection {
    pub fn multiplier(self) -> f64 {
        match self {
            LegDirection::Opposite => -1.0,
            LegDirection::Same => 1.0,
        }
    }
}

/// Open position of the simulator. Entry prices are zero while flat.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionState {
    pub side: PositionSide,
    pub entry_price_a: f64,
    pub entry_price_b: f64,
}

impl PositionState {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn open(side: PositionSide, entry_price_a: f64, entry_price_b: f64) -> Self {
        Self {
            side,
            entry_price_a,
            entry_price_b,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.side.is_flat()
    }
}
