//! Typed failures raised by the core.
//!
//! Every error is returned at the point of detection; no partial result is
//! produced alongside one.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// One or both input series are empty, or their timestamps do not overlap.
    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("duplicate timestamp {timestamp} in series '{symbol}'")]
    DuplicateTimestamp {
        symbol: String,
        timestamp: DateTime<Utc>,
    },

    #[error("non-finite close price at {timestamp} in series '{symbol}'")]
    NonFiniteClose {
        symbol: String,
        timestamp: DateTime<Utc>,
    },

    #[error("rows out of order: {current} does not follow {previous}")]
    UnorderedRows {
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    /// The spread cannot be standardized (too few rows or zero deviation).
    #[error("degenerate spread series: {0}")]
    DegenerateSeries(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
