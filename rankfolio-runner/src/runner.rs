//! Backtest runner — wires config, data, engine, and stress suite together.
//!
//! Two entry points:
//! - `run_from_files()`: loads spec + CSV from disk, then runs. Used by CLI.
//! - `run_from_panel()`: takes a pre-built panel. Used by tests and embedding.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rankfolio_core::config::ConfigError;
use rankfolio_core::domain::PricePanel;
use rankfolio_core::engine::{run_backtest, BacktestRun};
use rankfolio_core::stress::{run_standard_suite, StressOutcome};

use crate::config::{RunSpec, SpecError};
use crate::data_loader::{load_panel, LoadError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("spec error: {0}")]
    Spec(#[from] SpecError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one run: the backtest itself plus any stress outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub spec: RunSpec,
    pub run: BacktestRun,
    pub stress: Vec<StressOutcome>,
    /// Instruments and dates in the loaded panel, for provenance.
    pub instrument_count: usize,
    pub date_count: usize,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run a backtest against a pre-built panel — no I/O.
pub fn run_from_panel(panel: &PricePanel, spec: RunSpec) -> Result<BacktestReport, RunError> {
    let run = run_backtest(panel, spec.backtest.clone())?;
    let stress = if spec.stress.enabled {
        run_standard_suite(
            &run,
            spec.backtest.periods_per_year,
            spec.backtest.risk_free_rate,
            spec.stress.seed,
        )
    } else {
        Vec::new()
    };
    Ok(BacktestReport {
        schema_version: SCHEMA_VERSION,
        instrument_count: panel.instrument_count(),
        date_count: panel.dates().len(),
        spec,
        run,
        stress,
    })
}

/// Load a spec and a CSV panel from disk, then run. The high-level entry
/// point used by the CLI.
pub fn run_from_files(spec_path: &Path, data_path: &Path) -> Result<BacktestReport, RunError> {
    let spec = RunSpec::load(spec_path)?;
    let panel = load_panel(data_path)?;
    run_from_panel(&panel, spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StressSettings;
    use chrono::NaiveDate;
    use rankfolio_core::config::BacktestConfig;
    use rankfolio_core::domain::PriceObservation;
    use rankfolio_core::schedule::RebalanceCadence;
    use rankfolio_core::score::ScoringRule;

    fn small_panel() -> PricePanel {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let mut obs = Vec::new();
        for i in 0..30 {
            let date = start + chrono::Duration::days(i);
            obs.push(PriceObservation::new(date, "UP", 100.0 * 1.01f64.powi(i as i32)));
            obs.push(PriceObservation::new(date, "DN", 100.0 * 0.995f64.powi(i as i32)));
        }
        PricePanel::from_observations(obs).unwrap()
    }

    fn fast_spec() -> RunSpec {
        RunSpec {
            backtest: BacktestConfig {
                scoring: ScoringRule::Momentum {
                    lookback: 3,
                    skip_recent: 0,
                },
                cadence: RebalanceCadence::EveryNthDay { n: 2 },
                top_n: 1,
                max_weight: 1.0,
                ..BacktestConfig::frictionless()
            },
            stress: StressSettings::default(),
        }
    }

    #[test]
    fn run_from_panel_produces_report() {
        let report = run_from_panel(&small_panel(), fast_spec()).unwrap();
        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.instrument_count, 2);
        assert_eq!(report.date_count, 30);
        assert_eq!(report.run.points.len(), 30);
        assert!(report.run.summary.total_return > 0.0);
        assert!(report.stress.is_empty());
    }

    #[test]
    fn stress_suite_runs_when_enabled() {
        let spec = RunSpec {
            stress: StressSettings {
                enabled: true,
                seed: 5,
            },
            ..fast_spec()
        };
        let report = run_from_panel(&small_panel(), spec).unwrap();
        assert_eq!(report.stress.len(), 3);
        for outcome in &report.stress {
            assert!(outcome.summary.final_equity.is_finite());
        }
    }

    #[test]
    fn invalid_config_surfaces_as_config_error() {
        let spec = RunSpec {
            backtest: BacktestConfig {
                top_n: 0,
                ..BacktestConfig::default()
            },
            ..fast_spec()
        };
        assert!(matches!(
            run_from_panel(&small_panel(), spec),
            Err(RunError::Config(_))
        ));
    }

    #[test]
    fn run_from_files_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let spec_path = dir.path().join("run.toml");
        std::fs::write(
            &spec_path,
            r#"
                [backtest]
                top_n = 1
                max_weight = 1.0

                [backtest.scoring]
                type = "momentum"
                lookback = 2
                skip_recent = 0

                [backtest.cadence]
                type = "every_nth_day"
                n = 1
            "#,
        )
        .unwrap();

        let data_path = dir.path().join("prices.csv");
        let mut csv = String::from("date,instrument_id,close\n");
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        for i in 0..10 {
            let date = start + chrono::Duration::days(i);
            csv.push_str(&format!("{date},ACME,{}\n", 100.0 + i as f64));
        }
        std::fs::write(&data_path, csv).unwrap();

        let report = run_from_files(&spec_path, &data_path).unwrap();
        assert_eq!(report.instrument_count, 1);
        assert_eq!(report.run.points.len(), 10);
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = run_from_panel(&small_panel(), fast_spec()).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let back: BacktestReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
