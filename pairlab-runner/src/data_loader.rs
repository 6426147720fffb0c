//! Bar loading for the runner: the data-loading collaborator of the core.
//!
//! A series lives in a folder of CSV files (one per month or day, as exported
//! by the exchange). Files are read in sorted file-name order, concatenated,
//! sorted by timestamp and de-duplicated before the core ever sees them.
//!
//! Fallback policy:
//! 1. If both data folders are configured → load them
//! 2. If `synthetic` is requested → generate a synthetic pair (tagged)
//! 3. Otherwise → fail with a clear error
//!
//! Synthetic data is a developer-only debug mode.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, TimeZone, Utc};
use pairlab_core::domain::{Bar, Series};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PairSection;

/// Column holding the bar open time in milliseconds since the epoch.
const TIMESTAMP_COLUMN: &str = "open_time";

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path}: open_time {value} is out of range")]
    InvalidTimestamp { path: PathBuf, value: i64 },

    #[error("no CSV files found in {0}")]
    NoDataFiles(PathBuf),

    #[error("no data folder configured for '{symbol}' (use --synthetic for synthetic data)")]
    NoDataDir { symbol: String },
}

/// Options controlling how the pair is loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Generate a synthetic pair instead of reading folders.
    pub synthetic: bool,
    /// Number of hourly bars per synthetic series.
    pub synthetic_bars: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            synthetic: false,
            synthetic_bars: 2_000,
        }
    }
}

/// Both series plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedPair {
    pub series_a: Series,
    pub series_b: Series,
    /// BLAKE3 over both series, for fingerprinting.
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

/// One CSV row. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct CsvBar {
    open_time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Load the pair described by `pair`, falling back to synthetic data if asked.
pub fn load_pair(pair: &PairSection, opts: &LoadOptions) -> Result<LoadedPair, LoadError> {
    if opts.synthetic {
        warn!(
            symbol_a = %pair.symbol_a,
            symbol_b = %pair.symbol_b,
            "generating synthetic data, results will be tagged as synthetic"
        );
        let (series_a, series_b) =
            generate_synthetic_pair(&pair.symbol_a, &pair.symbol_b, opts.synthetic_bars);
        let dataset_hash = compute_dataset_hash(&series_a, &series_b);
        return Ok(LoadedPair {
            series_a,
            series_b,
            dataset_hash,
            has_synthetic: true,
        });
    }

    let dir_a = pair.data_dir_a.as_deref().ok_or_else(|| LoadError::NoDataDir {
        symbol: pair.symbol_a.clone(),
    })?;
    let dir_b = pair.data_dir_b.as_deref().ok_or_else(|| LoadError::NoDataDir {
        symbol: pair.symbol_b.clone(),
    })?;

    let series_a = load_series(dir_a, &pair.symbol_a)?;
    let series_b = load_series(dir_b, &pair.symbol_b)?;
    let dataset_hash = compute_dataset_hash(&series_a, &series_b);

    Ok(LoadedPair {
        series_a,
        series_b,
        dataset_hash,
        has_synthetic: false,
    })
}

/// Load every `*.csv` file in `dir` into one sorted, duplicate-free series.
///
/// Duplicate timestamps keep the first occurrence in file-name order; bars
/// with a non-finite price are dropped.
pub fn load_series(dir: &Path, symbol: &str) -> Result<Series, LoadError> {
    let files = csv_files(dir)?;
    if files.is_empty() {
        return Err(LoadError::NoDataFiles(dir.to_path_buf()));
    }

    let mut bars = Vec::new();
    for file in &files {
        let before = bars.len();
        read_csv_file(file, &mut bars)?;
        debug!(file = %file.display(), rows = bars.len() - before, "read bar file");
    }

    let raw_len = bars.len();
    bars.retain(|b: &Bar| !b.is_void());
    let void = raw_len - bars.len();

    // Stable sort keeps file order among equal timestamps, so dedup keeps the first.
    bars.sort_by_key(|b| b.timestamp);
    let sorted_len = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    let duplicates = sorted_len - bars.len();

    if void > 0 {
        warn!(symbol, void, "dropped bars with non-finite prices");
    }
    if duplicates > 0 {
        warn!(symbol, duplicates, "dropped duplicate timestamps, kept first occurrence");
    }
    let series = Series::new(symbol, bars);
    info!(
        symbol,
        files = files.len(),
        bars = series.len(),
        first = ?series.first_timestamp(),
        last = ?series.last_timestamp(),
        "loaded series"
    );

    Ok(series)
}

fn csv_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_csv_file(path: &Path, out: &mut Vec<Bar>) -> Result<(), LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    // Header names are trimmed here so the column check and serde agree.
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(csv_err)?;
    let has_timestamp = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .any(|h| h == TIMESTAMP_COLUMN);
    if !has_timestamp {
        return Err(LoadError::MissingColumn {
            path: path.to_path_buf(),
            column: TIMESTAMP_COLUMN.into(),
        });
    }

    for record in reader.deserialize::<CsvBar>() {
        let row = record.map_err(csv_err)?;
        let timestamp = DateTime::from_timestamp_millis(row.open_time).ok_or_else(|| {
            LoadError::InvalidTimestamp {
                path: path.to_path_buf(),
                value: row.open_time,
            }
        })?;
        out.push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    Ok(())
}

/// Compute a deterministic BLAKE3 hash over both series.
pub fn compute_dataset_hash(a: &Series, b: &Series) -> String {
    let mut hasher = blake3::Hasher::new();
    for series in [a, b] {
        hasher.update(series.symbol.as_bytes());
        hasher.update(b"\0");
        for bar in &series.bars {
            hasher.update(&bar.timestamp.timestamp_millis().to_le_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate a synthetic cointegrated pair of hourly series.
///
/// Leg A is a random walk; leg B tracks a fixed fraction of A plus a
/// mean-reverting deviation, so the spread oscillates around a stable level.
/// Seeded from the symbol names, so the same pair always gets the same data.
pub fn generate_synthetic_pair(symbol_a: &str, symbol_b: &str, bars: usize) -> (Series, Series) {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed_bytes = blake3::hash(format!("{symbol_a}/{symbol_b}").as_bytes());
    let mut rng = StdRng::from_seed(*seed_bytes.as_bytes());

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default();
    let ratio = 0.06;
    let mut price_a = 40_000.0_f64;
    let mut deviation = 0.0_f64;

    let mut out_a = Vec::with_capacity(bars);
    let mut out_b = Vec::with_capacity(bars);

    for i in 0..bars {
        let timestamp = start + Duration::hours(i as i64);

        let ret: f64 = rng.gen_range(-0.01..0.01);
        let open_a = price_a;
        price_a *= 1.0 + ret;
        deviation = 0.9 * deviation + rng.gen_range(-25.0..25.0);
        let price_b = price_a * ratio + deviation;
        let open_b = out_b.last().map_or(price_b, |b: &Bar| b.close);

        out_a.push(synthetic_bar(timestamp, open_a, price_a, rng.gen_range(0.0..0.004)));
        out_b.push(synthetic_bar(timestamp, open_b, price_b, rng.gen_range(0.0..0.004)));
    }

    (Series::new(symbol_a, out_a), Series::new(symbol_b, out_b))
}

fn synthetic_bar(timestamp: DateTime<Utc>, open: f64, close: f64, wick: f64) -> Bar {
    Bar {
        timestamp,
        open,
        high: open.max(close) * (1.0 + wick),
        low: open.min(close) * (1.0 - wick),
        close,
        volume: 1_000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "open_time,open,high,low,close,volume,close_time\n";

    fn write(dir: &Path, name: &str, body: &str) {
        let mut f = fs::File::create(dir.join(name)).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    fn row(ms: i64, close: f64) -> String {
        format!("{ms},{close},{close},{close},{close},10,{}\n", ms + 3_599_999)
    }

    #[test]
    fn concatenates_sorts_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let h = 3_600_000;
        // b.csv sorts after a.csv; its duplicate of hour 1 must lose.
        write(
            dir.path(),
            "a.csv",
            &format!("{HEADER}{}{}", row(2 * h, 102.0), row(h, 101.0)),
        );
        write(
            dir.path(),
            "b.csv",
            &format!("{HEADER}{}{}", row(h, 999.0), row(0, 100.0)),
        );
        write(dir.path(), "notes.txt", "ignored");

        let series = load_series(dir.path(), "BTC").unwrap();
        let closes: Vec<f64> = series.bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![100.0, 101.0, 102.0]);
        assert_eq!(series.symbol, "BTC");
        assert_eq!(series.bars[1].timestamp.timestamp_millis(), h);
        assert_eq!(series.first_timestamp().map(|t| t.timestamp_millis()), Some(0));
        assert_eq!(series.last_timestamp().map(|t| t.timestamp_millis()), Some(2 * h));
    }

    #[test]
    fn padded_header_names_still_load() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "a.csv",
            " open_time , open,high ,low,close,volume\n0,100,100,100,100,10\n",
        );
        let series = load_series(dir.path(), "BTC").unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.bars[0].close, 100.0);
    }

    #[test]
    fn missing_open_time_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.csv", "timestamp,open,high,low,close,volume\n1,1,1,1,1,1\n");
        let err = load_series(dir.path(), "BTC").unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { ref column, .. } if column == "open_time"));
    }

    #[test]
    fn empty_folder_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_series(dir.path(), "BTC"),
            Err(LoadError::NoDataFiles(_))
        ));
    }

    #[test]
    fn missing_folder_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            load_series(&missing, "BTC"),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn load_pair_requires_folders_without_synthetic() {
        let pair = PairSection::default();
        let err = load_pair(&pair, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::NoDataDir { ref symbol } if symbol == "BTC-USDT-SWAP"));
    }

    #[test]
    fn synthetic_pair_is_tagged_and_aligned() {
        let opts = LoadOptions {
            synthetic: true,
            synthetic_bars: 100,
        };
        let loaded = load_pair(&PairSection::default(), &opts).unwrap();
        assert!(loaded.has_synthetic);
        assert_eq!(loaded.series_a.len(), 100);
        assert_eq!(loaded.series_b.len(), 100);
        for (a, b) in loaded.series_a.bars.iter().zip(&loaded.series_b.bars) {
            assert_eq!(a.timestamp, b.timestamp);
            assert!(!a.is_void() && !b.is_void());
        }
    }

    #[test]
    fn synthetic_data_is_deterministic() {
        let (a1, b1) = generate_synthetic_pair("BTC", "ETH", 50);
        let (a2, b2) = generate_synthetic_pair("BTC", "ETH", 50);
        assert_eq!(a1, a2);
        assert_eq!(b1, b2);

        let (a3, _) = generate_synthetic_pair("BTC", "SOL", 50);
        assert_ne!(a1.bars[10].close, a3.bars[10].close);
    }

    #[test]
    fn dataset_hash_is_deterministic() {
        let (a, b) = generate_synthetic_pair("BTC", "ETH", 20);
        assert_eq!(compute_dataset_hash(&a, &b), compute_dataset_hash(&a, &b));
        assert_ne!(compute_dataset_hash(&a, &b), compute_dataset_hash(&b, &a));
    }
}
