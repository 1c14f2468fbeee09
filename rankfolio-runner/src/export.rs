//! Artifact export — JSON report, equity CSV, and a content checksum.
//!
//! Every persisted report carries a `schema_version` field; unknown versions
//! are rejected on load. The checksum file holds the BLAKE3 hash of
//! `summary.json`, so an artifact directory can be verified byte for byte.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rankfolio_core::domain::EquityPoint;

use crate::runner::{BacktestReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestReport` to pretty JSON.
pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a `BacktestReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
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

/// Export the equity curve as CSV.
///
/// Columns: date, equity, period_return, drawdown
pub fn export_equity_csv(points: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity", "period_return", "drawdown"])?;
    for p in points {
        wtr.write_record([
            &p.date.to_string(),
            &format!("{:.2}", p.equity),
            &format!("{:.8}", p.period_return),
            &format!("{:.8}", p.drawdown),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the rebalance log as CSV.
///
/// Columns: date, selected, turnover, transaction_cost, slippage_cost,
/// capped_trades
pub fn export_rebalances_csv(report: &BacktestReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "selected",
        "turnover",
        "transaction_cost",
        "slippage_cost",
        "capped_trades",
    ])?;
    for r in &report.run.rebalances {
        wtr.write_record([
            &r.date.to_string(),
            &r.selected.to_string(),
            &format!("{:.8}", r.turnover),
            &format!("{:.4}", r.transaction_cost),
            &format!("{:.4}", r.slippage_cost),
            &r.capped_trades.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a run.
///
/// Creates a directory named after the run id (first 12 hex chars) under
/// `output_dir` containing:
/// - `summary.json` — the full `BacktestReport`
/// - `equity.csv` — the equity curve
/// - `rebalances.csv` — per-rebalance diagnostics
/// - `checksum.txt` — BLAKE3 hash of `summary.json`
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    let short_id: String = report.run.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(short_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(report)?;
    std::fs::write(run_dir.join("summary.json"), &json)?;

    let equity_csv = export_equity_csv(&report.run.points)?;
    std::fs::write(run_dir.join("equity.csv"), &equity_csv)?;

    let rebalances_csv = export_rebalances_csv(report)?;
    std::fs::write(run_dir.join("rebalances.csv"), &rebalances_csv)?;

    let checksum = blake3::hash(json.as_bytes()).to_hex().to_string();
    std::fs::write(run_dir.join("checksum.txt"), format!("{checksum}\n"))?;

    Ok(run_dir)
}

/// Load a report back from an artifact directory, verifying the checksum.
pub fn load_artifacts(dir: &Path) -> Result<BacktestReport> {
    let json_path = dir.join("summary.json");
    let json = std::fs::read_to_string(&json_path)
        .with_context(|| format!("failed to read {}", json_path.display()))?;

    let checksum_path = dir.join("checksum.txt");
    if let Ok(recorded) = std::fs::read_to_string(&checksum_path) {
        let actual = blake3::hash(json.as_bytes()).to_hex().to_string();
        if recorded.trim() != actual {
            bail!(
                "checksum mismatch for {}: artifacts were modified",
                json_path.display()
            );
        }
    }
    import_json(&json)
}
