//! Entry-threshold sweep.
//!
//! The pair is aligned once; each threshold then re-runs signals and the
//! simulator on the shared table. Runs are independent, so they fan out
//! over rayon when parallelism is enabled.

use pairlab_core::data::align_series;
use pairlab_core::domain::{AlignedRow, Series};
use pairlab_core::{run_backtest_aligned, CoreError, PairConfig};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metrics::PerformanceSummary;

/// Outcome of one threshold in a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub threshold: f64,
    pub summary: PerformanceSummary,
}

/// Threshold sweep executor.
#[derive(Debug, Clone)]
pub struct ThresholdSweep {
    thresholds: Vec<f64>,
    parallel: bool,
}

impl ThresholdSweep {
    pub fn new(thresholds: Vec<f64>) -> Self {
        Self {
            thresholds,
            parallel: true,
        }
    }

    /// Evenly spaced thresholds from `start` to `end` inclusive.
    pub fn linspace(start: f64, end: f64, steps: usize) -> Self {
        let thresholds = match steps {
            0 => Vec::new(),
            1 => vec![start],
            n => (0..n)
                .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
                .collect(),
        };
        Self::new(thresholds)
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Run every threshold against the pair, keeping every other field of `base`.
    ///
    /// Fails on the first invalid threshold or data error. Results are
    /// sorted by threshold.
    pub fn run(
        &self,
        series_a: &Series,
        series_b: &Series,
        base: &PairConfig,
    ) -> Result<SweepResults, CoreError> {
        if self.thresholds.is_empty() {
            return Err(CoreError::InvalidConfig("sweep has no thresholds".into()));
        }
        if series_a.is_empty() || series_b.is_empty() {
            return Err(CoreError::EmptyInput("one or both input series are empty".into()));
        }
        let rows = align_series(series_a, series_b)?;
        if rows.is_empty() {
            return Err(CoreError::EmptyInput(format!(
                "no common timestamps between {} and {}",
                series_a.symbol, series_b.symbol
            )));
        }

        let mut points = if self.parallel {
            self.thresholds
                .par_iter()
                .map(|&t| run_point(&rows, base, t))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            self.thresholds
                .iter()
                .map(|&t| run_point(&rows, base, t))
                .collect::<Result<Vec<_>, _>>()?
        };

        points.sort_by(|x, y| x.threshold.total_cmp(&y.threshold));

        info!(points = points.len(), rows = rows.len(), "sweep finished");
        Ok(SweepResults { points })
    }
}

fn run_point(rows: &[AlignedRow], base: &PairConfig, threshold: f64) -> Result<SweepPoint, CoreError> {
    let config = base.clone().with_threshold(threshold);
    let result = run_backtest_aligned(rows, &config)?;
    Ok(SweepPoint {
        threshold,
        summary: PerformanceSummary::compute(&result),
    })
}

/// Results from a threshold sweep, sorted by threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepResults {
    points: Vec<SweepPoint>,
}

impl SweepResults {
    pub fn all(&self) -> &[SweepPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The point with the highest final capital. Ties go to the lower threshold.
    pub fn best_by_capital(&self) -> Option<&SweepPoint> {
        self.points.iter().fold(None, |best, p| match best {
            Some(b) if b.summary.final_capital >= p.summary.final_capital => Some(b),
            _ => Some(p),
        })
    }
}
