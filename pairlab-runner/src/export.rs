//! Artifact export: JSON report plus CSV ledger and signal table.
//!
//! The JSON report carries a `schema_version`; newer versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use pairlab_core::domain::{SignaledRow, Trade};

use crate::runner::{RunReport, SCHEMA_VERSION};

/// Characters of the run id used in artifact directory names.
const RUN_ID_PREFIX_LEN: usize = 12;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunReport` to pretty JSON.
pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize RunReport to JSON")
}

/// Deserialize a `RunReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunReport> {
    let report: RunReport =
        serde_json::from_str(json).context("failed to deserialize RunReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trade ledger.
///
/// Columns: timestamp, type, price_a, price_b, realized_pnl, capital_after,
/// end_of_data. P&L and capital are blank on entries.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "timestamp",
        "type",
        "price_a",
        "price_b",
        "realized_pnl",
        "capital_after",
        "end_of_data",
    ])?;

    for t in trades {
        wtr.write_record([
            t.timestamp.to_rfc3339(),
            t.kind.as_str().to_string(),
            format!("{:.6}", t.price_a),
            format!("{:.6}", t.price_b),
            t.realized_pnl.map(|p| format!("{p:.2}")).unwrap_or_default(),
            t.capital_after.map(|c| format!("{c:.2}")).unwrap_or_default(),
            t.end_of_data.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the annotated table for charting spread, z-score and markers.
pub fn export_signals_csv(rows: &[SignaledRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp",
        "close_a",
        "close_b",
        "spread",
        "z_score",
        "long_entry",
        "short_entry",
        "exit_signal",
    ])?;
    for r in rows {
        wtr.write_record([
            r.timestamp.to_rfc3339(),
            format!("{:.6}", r.close_a),
            format!("{:.6}", r.close_b),
            format!("{:.6}", r.spread),
            format!("{:.6}", r.z_score),
            r.long_entry.to_string(),
            r.short_entry.to_string(),
            r.exit_signal.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single run.
///
/// Creates `{symbol_a}_{symbol_b}_{run_id prefix}/` under `output_dir`
/// containing `report.json`, `trades_log.csv` and `signals.csv`. Re-running
/// the same configuration overwrites the same directory.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = report.run_id.chars().take(RUN_ID_PREFIX_LEN).collect();
    let dirname = format!("{}_{}_{}", report.symbol_a, report.symbol_b, prefix);
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(report)?;
    std::fs::write(run_dir.join("report.json"), json)
        .with_context(|| format!("failed to write report.json in {}", run_dir.display()))?;

    let trades_csv = export_trades_csv(&report.result.trades)?;
    std::fs::write(run_dir.join("trades_log.csv"), trades_csv)
        .with_context(|| format!("failed to write trades_log.csv in {}", run_dir.display()))?;

    let signals_csv = export_signals_csv(&report.result.annotated_table)?;
    std::fs::write(run_dir.join("signals.csv"), signals_csv)
        .with_context(|| format!("failed to write signals.csv in {}", run_dir.display()))?;

    Ok(run_dir)
}

/// Load a `RunReport` from an artifact directory's report.json.
pub fn load_report(run_dir: &Path) -> Result<RunReport> {
    let path = run_dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
