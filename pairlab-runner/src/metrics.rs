//! Performance summary: pure functions over the trade ledger.
//!
//! Capital only moves on exits, so the "equity curve" here is the capital
//! after each realized exit, starting from the initial capital.

use pairlab_core::domain::{Trade, TradeKind};
use pairlab_core::BacktestResult;
use serde::{Deserialize, Serialize};

/// Aggregate statistics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub starting_capital: f64,
    pub final_capital: f64,
    pub net_profit: f64,
    /// Net profit as a fraction of starting capital.
    pub total_return: f64,
    pub entries: usize,
    pub long_entries: usize,
    pub short_entries: usize,
    pub exits: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Worst peak-to-trough decline of realized capital, as a negative fraction.
    pub max_drawdown: f64,
    pub open_at_end: bool,
}

impl PerformanceSummary {
    pub fn compute(result: &BacktestResult) -> Self {
        let trades = &result.trades;
        let pnls = exit_pnls(trades);
        let count = |kind: TradeKind| trades.iter().filter(|t| t.kind == kind).count();

        let mut curve = vec![result.starting_capital];
        curve.extend(trades.iter().filter_map(|t| t.capital_after));

        Self {
            starting_capital: result.starting_capital,
            final_capital: result.final_capital,
            net_profit: result.net_profit(),
            total_return: total_return(result.starting_capital, result.final_capital),
            entries: count(TradeKind::Long) + count(TradeKind::Short),
            long_entries: count(TradeKind::Long),
            short_entries: count(TradeKind::Short),
            exits: pnls.len(),
            winning_trades: pnls.iter().filter(|&&p| p > 0.0).count(),
            losing_trades: pnls.iter().filter(|&&p| p < 0.0).count(),
            win_rate: win_rate(&pnls),
            profit_factor: profit_factor(&pnls),
            largest_win: pnls.iter().copied().fold(0.0, f64::max),
            largest_loss: pnls.iter().copied().fold(0.0, f64::min),
            max_drawdown: max_drawdown(&curve),
            open_at_end: result.final_state.is_open(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Realized P&L of every exit in ledger order.
pub fn exit_pnls(trades: &[Trade]) -> Vec<f64> {
    trades.iter().filter_map(|t| t.realized_pnl).collect()
}

/// (final - initial) / initial, or 0.0 for a non-positive base.
pub fn total_return(initial: f64, final_capital: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_capital - initial) / initial
}

/// Fraction of closed round trips with positive P&L.
pub fn win_rate(pnls: &[f64]) -> f64 {
    if pnls.is_empty() {
        return 0.0;
    }
    pnls.iter().filter(|&&p| p > 0.0).count() as f64 / pnls.len() as f64
}

/// Gross profits / gross losses. Capped at 100.0 when there are no losses.
pub fn profit_factor(pnls: &[f64]) -> f64 {
    let gross_profit: f64 = pnls.iter().filter(|&&p| p > 0.0).sum();
    let gross_loss: f64 = pnls.iter().filter(|&&p| p < 0.0).map(|p| p.abs()).sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Maximum drawdown as a negative fraction of the running peak.
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let Some(&first) = curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &value in curve {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            max_dd = max_dd.min((value - peak) / peak);
        }
    }
    max_dd
}
