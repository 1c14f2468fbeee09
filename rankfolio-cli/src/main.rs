//! Rankfolio CLI — run and check commands.
//!
//! Commands:
//! - `run` — execute a backtest from a TOML spec and a CSV price panel
//! - `check` — validate a spec and panel without simulating

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rankfolio_runner::{load_panel, run_from_panel, save_artifacts, BacktestReport, RunSpec};

#[derive(Parser)]
#[command(
    name = "rankfolio",
    about = "Rankfolio CLI — cross-sectional backtest engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML spec file and a CSV price panel.
    Run {
        /// Path to the TOML run spec.
        #[arg(long)]
        spec: PathBuf,

        /// Path to the long-format CSV price panel.
        #[arg(long)]
        data: PathBuf,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Run the stress suite regardless of the spec's [stress] setting.
        #[arg(long, default_value_t = false)]
        stress: bool,

        /// Override the stress seed from the spec.
        #[arg(long)]
        seed: Option<u64>,

        /// Print the full report as JSON instead of the text summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Validate a spec file and (optionally) a data file without running.
    Check {
        /// Path to the TOML run spec.
        #[arg(long)]
        spec: PathBuf,

        /// Path to a CSV price panel to validate alongside the spec.
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            spec,
            data,
            output_dir,
            stress,
            seed,
            json,
        } => run_cmd(spec, data, output_dir, stress, seed, json),
        Commands::Check { spec, data } => check_cmd(spec, data),
    }
}

fn run_cmd(
    spec_path: PathBuf,
    data_path: PathBuf,
    output_dir: PathBuf,
    stress: bool,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let mut spec = RunSpec::load(&spec_path)?;
    if stress {
        spec.stress.enabled = true;
    }
    if let Some(seed) = seed {
        spec.stress.seed = seed;
    }

    let panel = load_panel(&data_path)?;
    let report = run_from_panel(&panel, spec)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    let run_dir =
        save_artifacts(&report, &output_dir).context("failed to save run artifacts")?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn check_cmd(spec_path: PathBuf, data_path: Option<PathBuf>) -> Result<()> {
    let spec = RunSpec::load(&spec_path)?;
    println!("Spec OK: {}", spec_path.display());
    println!("  run id: {}", spec.backtest.run_id());

    if let Some(data_path) = data_path {
        let panel = load_panel(&data_path)?;
        println!("Data OK: {}", data_path.display());
        println!("  instruments: {}", panel.instrument_count());
        println!("  dates:       {}", panel.dates().len());
    }
    Ok(())
}

fn print_summary(report: &BacktestReport) {
    let s = &report.run.summary;
    println!();
    println!("=== Backtest Result ===");
    println!("Run id:         {}", report.run.run_id);
    println!(
        "Panel:          {} instruments, {} dates",
        report.instrument_count, report.date_count
    );
    println!("Rebalances:     {}", report.run.rebalances.len());
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", s.total_return * 100.0);
    println!("CAGR:           {:.2}%", s.cagr * 100.0);
    println!("Volatility:     {:.2}%", s.volatility * 100.0);
    println!("Sharpe:         {:.3}", s.sharpe);
    println!("Max Drawdown:   {:.2}%", s.max_drawdown * 100.0);
    println!("Final Equity:   {:.2}", s.final_equity);

    let total_cost: f64 = report
        .run
        .rebalances
        .iter()
        .map(|r| r.transaction_cost + r.slippage_cost)
        .sum();
    let capped: usize = report.run.rebalances.iter().map(|r| r.capped_trades).sum();
    println!();
    println!("--- Execution ---");
    println!("Total Costs:    {total_cost:.2}");
    println!("Capped Trades:  {capped}");

    if !report.stress.is_empty() {
        println!();
        println!("--- Stress Scenarios ---");
        for outcome in &report.stress {
            println!(
                "{:<18} return {:>8.2}%  max dd {:>8.2}%  sharpe {:>7.3}",
                outcome.scenario,
                outcome.summary.total_return * 100.0,
                outcome.summary.max_drawdown * 100.0,
                outcome.summary.sharpe,
            );
        }
    }
}
