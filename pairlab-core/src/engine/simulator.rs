//! Pair position simulator: the Flat/Long/Short state machine.
//!
//! Transition table, one action at most per row:
//!
//! | State        | Row            | Action                    | Next  |
//! |--------------|----------------|---------------------------|-------|
//! | Flat         | long_entry     | open long spread          | Long  |
//! | Flat         | short_entry    | open short spread         | Short |
//! | Long / Short | exit_signal    | book P&L of both legs     | Flat  |
//! | any          | anything else  | nothing                   | same  |
//!
//! Entry flags are ignored while a position is open (no pyramiding, no
//! flipping) and exit flags are ignored while flat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::accounting::{leg_pnl, CapitalTracker};
use crate::config::PairConfig;
use crate::domain::{LegDirection, PositionSide, PositionState, SignaledRow, Trade, TradeKind};
use crate::error::CoreError;

/// Sizing and end-of-run policy of the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub unit_size_a: f64,
    pub unit_size_b: f64,
    pub leg_b_direction: LegDirection,
    pub close_on_end: bool,
}

impl From<&PairConfig> for SimulatorConfig {
    fn from(config: &PairConfig) -> Self {
        Self {
            unit_size_a: config.unit_size_a,
            unit_size_b: config.unit_size_b,
            leg_b_direction: config.leg_b_direction,
            close_on_end: config.close_on_end,
        }
    }
}

/// What the state machine does on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Hold,
    Open(PositionSide),
    Close,
}

/// Pure transition function of the state machine.
pub fn decide(state: &PositionState, row: &SignaledRow) -> Action {
    match state.side {
        PositionSide::Flat if row.long_entry => Action::Open(PositionSide::Long),
        PositionSide::Flat if row.short_entry => Action::Open(PositionSide::Short),
        PositionSide::Long | PositionSide::Short if row.exit_signal => Action::Close,
        _ => Action::Hold,
    }
}

/// Final state of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub final_capital: f64,
    pub realized_pnl: f64,
    pub trades: Vec<Trade>,
    /// Position still open when the data ran out (Flat after a close-out).
    pub final_state: PositionState,
}

/// Stateful walker over a signaled table.
///
/// Each run owns its state and capital; nothing is shared between runs.
#[derive(Debug, Clone)]
pub struct PositionSimulator {
    config: SimulatorConfig,
    state: PositionState,
    tracker: CapitalTracker,
    trades: Vec<Trade>,
    last_row: Option<SignaledRow>,
}

impl PositionSimulator {
    pub fn new(config: SimulatorConfig, starting_capital: f64) -> Self {
        Self {
            config,
            state: PositionState::flat(),
            tracker: CapitalTracker::new(starting_capital),
            trades: Vec::new(),
            last_row: None,
        }
    }

    /// Process one row. Returns the trade appended for it, if any.
    ///
    /// Rows must arrive in strictly increasing timestamp order.
    pub fn step(&mut self, row: &SignaledRow) -> Result<Option<&Trade>, CoreError> {
        if let Some(prev) = &self.last_row {
            if row.timestamp <= prev.timestamp {
                return Err(CoreError::UnorderedRows {
                    previous: prev.timestamp,
                    current: row.timestamp,
                });
            }
        }
        self.last_row = Some(*row);

        let appended = match decide(&self.state, row) {
            Action::Hold => false,
            Action::Open(side) => {
                self.open(side, row);
                true
            }
            Action::Close => {
                self.close(row.timestamp, row.close_a, row.close_b, false);
                true
            }
        };

        Ok(if appended { self.trades.last() } else { None })
    }

    /// Finish the run, applying the end-of-data policy.
    pub fn finish(mut self) -> SimulationOutcome {
        if self.config.close_on_end && self.state.is_open() {
            if let Some(last) = self.last_row {
                info!(
                    side = ?self.state.side,
                    timestamp = %last.timestamp,
                    "closing open position at end of data"
                );
                self.close(last.timestamp, last.close_a, last.close_b, true);
            }
        }

        SimulationOutcome {
            final_capital: self.tracker.capital(),
            realized_pnl: self.tracker.realized_pnl(),
            trades: self.trades,
            final_state: self.state,
        }
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn capital(&self) -> f64 {
        self.tracker.capital()
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    fn open(&mut self, side: PositionSide, row: &SignaledRow) {
        self.state = PositionState::open(side, row.close_a, row.close_b);
        let kind = match side {
            PositionSide::Short => TradeKind::Short,
            _ => TradeKind::Long,
        };
        debug!(
            timestamp = %row.timestamp,
            ?kind,
            z_score = row.z_score,
            price_a = row.close_a,
            price_b = row.close_b,
            "open pair position"
        );
        self.trades
            .push(Trade::entry(row.timestamp, kind, row.close_a, row.close_b));
    }

    fn close(&mut self, timestamp: DateTime<Utc>, price_a: f64, price_b: f64, end_of_data: bool) {
        let sign_a = self.state.side.sign();
        let sign_b = sign_a * self.config.leg_b_direction.multiplier();

        let pnl_a = leg_pnl(sign_a, self.state.entry_price_a, price_a, self.config.unit_size_a);
        let pnl_b = leg_pnl(sign_b, self.state.entry_price_b, price_b, self.config.unit_size_b);
        let pnl = pnl_a + pnl_b;
        let capital = self.tracker.book(pnl);

        debug!(
            timestamp = %timestamp,
            side = ?self.state.side,
            pnl_a,
            pnl_b,
            capital,
            "close pair position"
        );

        let mut trade = Trade::exit(timestamp, price_a, price_b, pnl, capital);
        trade.end_of_data = end_of_data;
        self.trades.push(trade);
        self.state = PositionState::flat();
    }
}

/// Run the simulator over a whole signaled table.
pub fn simulate(
    rows: &[SignaledRow],
    config: SimulatorConfig,
    starting_capital: f64,
) -> Result<SimulationOutcome, CoreError> {
    let mut sim = PositionSimulator::new(config, starting_capital);
    for row in rows {
        sim.step(row)?;
    }
    Ok(sim.finish())
}
