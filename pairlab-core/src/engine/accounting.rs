//! Realized P&L and running capital.

use serde::{Deserialize, Serialize};

/// Realized P&L of one leg: `sign * (exit - entry) * size`.
///
/// `sign` is +1 for a long leg and -1 for a short leg.
pub fn leg_pnl(sign: f64, entry_price: f64, exit_price: f64, size: f64) -> f64 {
    sign * (exit_price - entry_price) * size
}

/// Running capital. Only realized P&L moves it; open positions are not
/// marked to market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalTracker {
    capital: f64,
    realized_pnl: f64,
}

impl CapitalTracker {
    pub fn new(starting_capital: f64) -> Self {
        Self {
            capital: starting_capital,
            realized_pnl: 0.0,
        }
    }

    /// Book the P&L of a closed position and return the new capital.
    pub fn book(&mut self, pnl: f64) -> f64 {
        self.capital += pnl;
        self.realized_pnl += pnl;
        self.capital
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }
}
