//! Two-symbol time alignment.
//!
//! Keeps only timestamps present in both series (inner join). Unlike a
//! union timeline there are no void rows: a timestamp missing from either
//! side is dropped entirely.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{AlignedRow, Series};
use crate::error::CoreError;

/// Align two series on their common timestamps, ascending.
///
/// Inputs may be unsorted. A duplicate timestamp or a non-finite close in
/// either series is an error; dedup belongs to the loader. An empty
/// intersection is returned as an empty table.
pub fn align_series(a: &Series, b: &Series) -> Result<Vec<AlignedRow>, CoreError> {
    let closes_a = close_map(a)?;
    let closes_b = close_map(b)?;

    let rows: Vec<AlignedRow> = closes_a
        .iter()
        .filter_map(|(ts, &close_a)| {
            closes_b.get(ts).map(|&close_b| AlignedRow {
                timestamp: *ts,
                close_a,
                close_b,
            })
        })
        .collect();

    debug!(
        symbol_a = %a.symbol,
        symbol_b = %b.symbol,
        len_a = a.len(),
        len_b = b.len(),
        aligned = rows.len(),
        "aligned pair"
    );

    Ok(rows)
}

/// Build a timestamp → close lookup, rejecting duplicates and bad prices.
fn close_map(series: &Series) -> Result<BTreeMap<DateTime<Utc>, f64>, CoreError> {
    let mut map = BTreeMap::new();
    for bar in &series.bars {
        if !bar.close.is_finite() {
            return Err(CoreError::NonFiniteClose {
                symbol: series.symbol.clone(),
                timestamp: bar.timestamp,
            });
        }
        if map.insert(bar.timestamp, bar.close).is_some() {
            return Err(CoreError::DuplicateTimestamp {
                symbol: series.symbol.clone(),
                timestamp: bar.timestamp,
            });
        }
    }
    Ok(map)
}
