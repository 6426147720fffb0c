//! PairLab Core — domain types, alignment, spread signals, pair simulation.
//!
//! This crate contains the heart of the pairs-trading backtester:
//! - Domain types (bars, series, aligned/signaled rows, position state, trades)
//! - Inner-join alignment of two price series
//! - Full-sample spread z-score and threshold signals
//! - Flat/Long/Short position state machine with realized P&L accounting
//! - One-pass orchestrator returning capital, ledger and annotated table
//!
//! The crate performs no file or network I/O.

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod signal;

pub use config::PairConfig;
pub use engine::{run_backtest, run_backtest_aligned, BacktestResult};
pub use error::CoreError;
