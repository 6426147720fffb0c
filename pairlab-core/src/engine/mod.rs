//! Backtesting engine: pair position simulation and the one-pass orchestrator.
//!
//! The orchestrator runs three stages in sequence:
//!
//! 1. Align: inner-join the two series on timestamp
//! 2. Signal: full-sample spread z-score and threshold flags
//! 3. Simulate: walk the table through the Flat/Long/Short state machine

pub mod accounting;
pub mod backtest;
pub mod simulator;

pub use accounting::{leg_pnl, CapitalTracker};
pub use backtest::{run_backtest, run_backtest_aligned, BacktestResult};
pub use simulator::{decide, simulate, Action, PositionSimulator, SimulationOutcome, SimulatorConfig};
