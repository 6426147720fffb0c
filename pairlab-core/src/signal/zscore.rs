//! Z-score signal generation over an aligned pair table.

use tracing::debug;

use super::stats::{SpreadStats, StdDevMode};
use crate::domain::{AlignedRow, SignaledRow};
use crate::error::CoreError;

/// Threshold flags for a single z-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalFlags {
    pub long_entry: bool,
    pub short_entry: bool,
    pub exit_signal: bool,
}

/// Derive entry/exit flags from a z-score and a symmetric threshold.
///
/// At exactly `|z| == threshold` no flag is set.
pub fn classify(z_score: f64, threshold: f64) -> SignalFlags {
    SignalFlags {
        long_entry: z_score < -threshold,
        short_entry: z_score > threshold,
        exit_signal: z_score.abs() < threshold,
    }
}

/// Annotate every aligned row with spread, z-score and signal flags.
///
/// Output has the same length and order as `rows`. `threshold` must be
/// positive and finite.
pub fn compute_signals(
    rows: &[AlignedRow],
    threshold: f64,
    mode: StdDevMode,
) -> Result<(Vec<SignaledRow>, SpreadStats), CoreError> {
    if !(threshold.is_finite() && threshold > 0.0) {
        return Err(CoreError::InvalidConfig(format!(
            "z_threshold must be positive and finite, got {threshold}"
        )));
    }

    let spreads: Vec<f64> = rows.iter().map(AlignedRow::spread).collect();
    let stats = SpreadStats::compute(&spreads, mode)?;

    debug!(
        rows = stats.count,
        mean = stats.mean,
        std_dev = stats.std_dev,
        threshold,
        "spread statistics"
    );

    let signaled = rows
        .iter()
        .zip(&spreads)
        .map(|(row, &spread)| {
            let z_score = stats.z_score(spread);
            let flags = classify(z_score, threshold);
            SignaledRow {
                timestamp: row.timestamp,
                close_a: row.close_a,
                close_b: row.close_b,
                spread,
                z_score,
                long_entry: flags.long_entry,
                short_entry: flags.short_entry,
                exit_signal: flags.exit_signal,
            }
        })
        .collect();

    Ok((signaled, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn rows(closes: &[(f64, f64)]) -> Vec<AlignedRow> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &(a, b))| AlignedRow {
                timestamp: start + Duration::hours(i as i64),
                close_a: a,
                close_b: b,
            })
            .collect()
    }

    #[test]
    fn classify_regions() {
        assert_eq!(
            classify(-2.0, 1.5),
            SignalFlags {
                long_entry: true,
                short_entry: false,
                exit_signal: false
            }
        );
        assert_eq!(
            classify(2.0, 1.5),
            SignalFlags {
                long_entry: false,
                short_entry: true,
                exit_signal: false
            }
        );
        assert_eq!(
            classify(0.3, 1.5),
            SignalFlags {
                long_entry: false,
                short_entry: false,
                exit_signal: true
            }
        );
        assert_eq!(classify(1.5, 1.5), SignalFlags::default());
        assert_eq!(classify(-1.5, 1.5), SignalFlags::default());
    }

    #[test]
    fn spread_is_a_minus_b() {
        let table = rows(&[(100.0, 100.0), (101.0, 99.0), (99.0, 101.0)]);
        let (signaled, stats) = compute_signals(&table, 1.0, StdDevMode::Sample).unwrap();
        let spreads: Vec<f64> = signaled.iter().map(|r| r.spread).collect();
        assert_eq!(spreads, vec![0.0, 2.0, -2.0]);
        assert_eq!(stats.count, 3);
        assert!(stats.mean.abs() < 1e-12);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
        assert!((signaled[1].z_score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn preserves_length_and_timestamps() {
        let table = rows(&[(10.0, 9.0), (11.0, 9.0), (12.0, 9.5), (10.0, 10.0)]);
        let (signaled, _) = compute_signals(&table, 1.5, StdDevMode::Sample).unwrap();
        assert_eq!(signaled.len(), table.len());
        for (s, a) in signaled.iter().zip(&table) {
            assert_eq!(s.timestamp, a.timestamp);
            assert_eq!(s.close_a, a.close_a);
            assert_eq!(s.close_b, a.close_b);
        }
    }

    #[test]
    fn constant_spread_is_degenerate() {
        let table = rows(&[(101.0, 100.0), (102.0, 101.0), (103.0, 102.0)]);
        assert!(matches!(
            compute_signals(&table, 1.0, StdDevMode::Sample),
            Err(CoreError::DegenerateSeries(_))
        ));
    }

    #[test]
    fn non_positive_threshold_is_rejected() {
        let table = rows(&[(1.0, 0.0), (2.0, 0.0)]);
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                compute_signals(&table, bad, StdDevMode::Sample),
                Err(CoreError::InvalidConfig(_))
            ));
        }
    }
}
