//! Rankfolio Runner — backtest orchestration around `rankfolio-core`.
//!
//! This crate builds on the core engine to provide:
//! - TOML run specifications covering every engine knob
//! - Strict CSV panel loading with typed rejection errors
//! - A single-run entry point with optional stress-suite execution
//! - Artifact export (JSON report, equity/rebalance CSVs, checksum)

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use config::{RunSpec, SpecError, StressSettings};
pub use data_loader::{load_panel, panel_from_csv_str, LoadError};
pub use export::{
    export_equity_csv, export_json, export_rebalances_csv, import_json, load_artifacts,
    save_artifacts,
};
pub use runner::{run_from_files, run_from_panel, BacktestReport, RunError, SCHEMA_VERSION};
