//! One-pass backtest orchestrator: align → signal → simulate.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::simulator::{simulate, SimulatorConfig};
use crate::config::PairConfig;
use crate::data::align_series;
use crate::domain::{AlignedRow, PositionState, Series, SignaledRow, Trade};
use crate::error::CoreError;
use crate::signal::{compute_signals, SpreadStats};

/// Everything a backtest run produces. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub starting_capital: f64,
    pub final_capital: f64,
    pub trades: Vec<Trade>,
    /// Aligned rows with spread, z-score and signal flags, for charting.
    pub annotated_table: Vec<SignaledRow>,
    pub spread_stats: SpreadStats,
    /// Position left open at the end of the data, if close-out is disabled.
    pub final_state: PositionState,
}

impl BacktestResult {
    pub fn net_profit(&self) -> f64 {
        self.final_capital - self.starting_capital
    }
}

/// Run a full pair backtest on two raw series.
///
/// Configuration is validated before anything else. Empty inputs and an
/// empty timestamp intersection are reported as `EmptyInput` rather than
/// returning a zero-trade result.
pub fn run_backtest(
    series_a: &Series,
    series_b: &Series,
    config: &PairConfig,
) -> Result<BacktestResult, CoreError> {
    config.validate()?;

    for series in [series_a, series_b] {
        if series.is_empty() {
            return Err(CoreError::EmptyInput(format!(
                "series '{}' has no bars",
                series.symbol
            )));
        }
    }

    let aligned = align_series(series_a, series_b)?;
    if aligned.is_empty() {
        return Err(CoreError::EmptyInput(format!(
            "series '{}' and '{}' share no timestamps",
            series_a.symbol, series_b.symbol
        )));
    }

    run_aligned(&aligned, config)
}

/// Run a backtest on an already-aligned table.
///
/// The table is checked for emptiness, strictly increasing timestamps and
/// finite closes before use.
pub fn run_backtest_aligned(
    rows: &[AlignedRow],
    config: &PairConfig,
) -> Result<BacktestResult, CoreError> {
    config.validate()?;

    if rows.is_empty() {
        return Err(CoreError::EmptyInput("aligned table has no rows".into()));
    }
    for row in rows {
        if !(row.close_a.is_finite() && row.close_b.is_finite()) {
            return Err(CoreError::NonFiniteClose {
                symbol: "aligned".into(),
                timestamp: row.timestamp,
            });
        }
    }
    for pair in rows.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(CoreError::UnorderedRows {
                previous: pair[0].timestamp,
                current: pair[1].timestamp,
            });
        }
    }

    run_aligned(rows, config)
}

fn run_aligned(rows: &[AlignedRow], config: &PairConfig) -> Result<BacktestResult, CoreError> {
    let (annotated_table, spread_stats) =
        compute_signals(rows, config.z_threshold, config.std_dev_mode)?;

    let outcome = simulate(
        &annotated_table,
        SimulatorConfig::from(config),
        config.starting_capital,
    )?;

    info!(
        rows = annotated_table.len(),
        trades = outcome.trades.len(),
        starting_capital = config.starting_capital,
        final_capital = outcome.final_capital,
        open_at_end = outcome.final_state.is_open(),
        "backtest complete"
    );

    Ok(BacktestResult {
        starting_capital: config.starting_capital,
        final_capital: outcome.final_capital,
        trades: outcome.trades,
        annotated_table,
        spread_stats,
        final_state: outcome.final_state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, LegDirection, TradeKind};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn hour(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    fn series(symbol: &str, closes: &[f64]) -> Series {
        Series::new(
            symbol,
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| Bar::from_close(hour(i as i64), c))
                .collect(),
        )
    }

    #[test]
    fn invalid_config_fails_before_data_checks() {
        let empty = Series::new("A", vec![]);
        let config = PairConfig::default().with_threshold(0.0);
        assert!(matches!(
            run_backtest(&empty, &empty, &config),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_series_is_reported() {
        let a = series("A", &[1.0, 2.0]);
        let b = Series::new("B", vec![]);
        let err = run_backtest(&a, &b, &PairConfig::default()).unwrap_err();
        assert!(matches!(err, CoreError::EmptyInput(ref msg) if msg.contains("'B'")));
    }

    #[test]
    fn annotated_table_matches_alignment() {
        let a = series("A", &[100.0, 101.0, 99.0, 98.0, 102.0]);
        let b = series("B", &[100.0, 99.0, 101.0, 100.0, 98.0]);
        let result = run_backtest(&a, &b, &PairConfig::default()).unwrap();
        assert_eq!(result.annotated_table.len(), 5);
        assert_eq!(result.starting_capital, 1000.0);
        assert_eq!(result.spread_stats.count, 5);
    }

    #[test]
    fn aligned_entry_point_checks_order() {
        let rows = vec![
            AlignedRow {
                timestamp: hour(1),
                close_a: 1.0,
                close_b: 0.0,
            },
            AlignedRow {
                timestamp: hour(0),
                close_a: 2.0,
                close_b: 0.0,
            },
        ];
        assert!(matches!(
            run_backtest_aligned(&rows, &PairConfig::default()),
            Err(CoreError::UnorderedRows { .. })
        ));
        assert!(matches!(
            run_backtest_aligned(&[], &PairConfig::default()),
            Err(CoreError::EmptyInput(_))
        ));
    }

    #[test]
    fn net_profit_after_close_out() {
        let a = series("A", &[100.0, 101.0, 99.0, 98.0, 102.0]);
        let b = series("B", &[100.0, 99.0, 101.0, 100.0, 98.0]);
        let config = PairConfig {
            z_threshold: 0.9,
            close_on_end: true,
            leg_b_direction: LegDirection::Opposite,
            ..PairConfig::default()
        };
        let result = run_backtest(&a, &b, &config).unwrap();
        let kinds: Vec<_> = result.trades.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TradeKind::Long, TradeKind::Exit]);
        assert!((result.net_profit() - 6.0).abs() < 1e-12);
    }
}
