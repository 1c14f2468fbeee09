//! CSV panel loading.
//!
//! Input is long-format CSV with one observation per row. Required columns:
//! `date` (YYYY-MM-DD), `instrument_id`, `close`. Optional: `volume`.
//! Malformed rows are rejected outright with their line number — silently
//! skipping bad market data corrupts every downstream number.

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use rankfolio_core::domain::{PanelError, PriceObservation, PricePanel};

/// Errors from the CSV loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("missing required column '{0}' (need date, instrument_id, close)")]
    MissingColumn(&'static str),
    #[error("line {line}: {source}")]
    Malformed { line: u64, source: csv::Error },
    #[error("line {line}: invalid date '{value}' (expected YYYY-MM-DD)")]
    BadDate { line: u64, value: String },
    #[error("invalid panel: {0}")]
    Panel(#[from] PanelError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct RawRow {
    date: String,
    instrument_id: String,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

/// Parse a panel from CSV text.
pub fn panel_from_csv_str(text: &str) -> Result<PricePanel, LoadError> {
    panel_from_reader(csv::Reader::from_reader(text.as_bytes()))
}

/// Load a panel from a CSV file.
pub fn load_panel(path: &Path) -> Result<PricePanel, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    panel_from_reader(csv::Reader::from_reader(std::io::BufReader::new(file)))
}

fn panel_from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<PricePanel, LoadError> {
    let headers = reader.headers()?.clone();
    for required in ["date", "instrument_id", "close"] {
        if !headers.iter().any(|h| h == required) {
            return Err(LoadError::MissingColumn(required));
        }
    }

    let mut observations = Vec::new();
    for (i, row) in reader.deserialize::<RawRow>().enumerate() {
        // Header is line 1; the first record is line 2.
        let line = i as u64 + 2;
        let row = row.map_err(|source| LoadError::Malformed { line, source })?;
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|_| {
            LoadError::BadDate {
                line,
                value: row.date.clone(),
            }
        })?;
        let obs = match row.volume {
            Some(v) => PriceObservation::with_volume(date, row.instrument_id, row.close, v),
            None => PriceObservation::new(date, row.instrument_id, row.close),
        };
        observations.push(obs);
    }
    Ok(PricePanel::from_observations(observations)?)
}
