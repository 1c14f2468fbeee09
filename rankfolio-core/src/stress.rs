//! Stress testing — replay a finished run's period returns through adverse
//! overlays and re-score the result.
//!
//! Scenarios perturb the realized return stream, not the price panel, so a
//! stress run never re-trades: it answers "what would this exact portfolio
//! path have looked like under worse conditions".

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::analytics::PerformanceSummary;
use crate::domain::EquityPoint;
use crate::engine::BacktestRun;

/// Closed set of stress overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StressScenario {
    /// A single large negative return compounded into one period.
    CrashShock { shock: f64, at_period: usize },

    /// Seeded gaussian noise added on top of every period return.
    VolatilityStorm { sigma: f64, seed: u64 },

    /// A steady per-period decline compounded across the whole run, sized so
    /// the overlay alone loses `total_decline` end to end.
    ProlongedBear { total_decline: f64 },
}

impl StressScenario {
    pub fn name(&self) -> &'static str {
        match self {
            StressScenario::CrashShock { .. } => "crash_shock",
            StressScenario::VolatilityStorm { .. } => "volatility_storm",
            StressScenario::ProlongedBear { .. } => "prolonged_bear",
        }
    }

    /// Apply the overlay to a period-return stream.
    pub fn apply(&self, returns: &[f64]) -> Vec<f64> {
        match *self {
            StressScenario::CrashShock { shock, at_period } => {
                let mut out = returns.to_vec();
                if let Some(r) = out.get_mut(at_period) {
                    *r = (1.0 + *r) * (1.0 + shock) - 1.0;
                }
                out
            }
            StressScenario::VolatilityStorm { sigma, seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                returns
                    .iter()
                    .map(|&r| r + sigma * gaussian(&mut rng))
                    .collect()
            }
            StressScenario::ProlongedBear { total_decline } => {
                if returns.is_empty() {
                    return Vec::new();
                }
                let per_period = (1.0 + total_decline).powf(1.0 / returns.len() as f64) - 1.0;
                returns
                    .iter()
                    .map(|&r| (1.0 + r) * (1.0 + per_period) - 1.0)
                    .collect()
            }
        }
    }
}

/// Standard normal draw via Box-Muller.
fn gaussian(rng: &mut StdRng) -> f64 {
    // 1 - u keeps the argument of ln strictly positive.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// One stressed re-scoring of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressOutcome {
    pub scenario: String,
    pub summary: PerformanceSummary,
}

/// Rebuild an equity curve from a return stream, recomputing drawdowns.
fn rebuild_curve(dates: &[NaiveDate], initial: f64, returns: &[f64]) -> Vec<EquityPoint> {
    let mut points = Vec::with_capacity(dates.len());
    let mut equity = initial;
    let mut peak = initial;
    for (i, &date) in dates.iter().enumerate() {
        let r = if i == 0 { 0.0 } else { returns[i - 1] };
        equity *= 1.0 + r;
        if equity > peak {
            peak = equity;
        }
        points.push(EquityPoint {
            date,
            equity,
            period_return: r,
            drawdown: if peak > 0.0 { equity / peak - 1.0 } else { 0.0 },
        });
    }
    points
}

/// Score one scenario against a completed run.
pub fn run_scenario(
    run: &BacktestRun,
    scenario: &StressScenario,
    periods_per_year: f64,
    risk_free_rate: f64,
) -> StressOutcome {
    if run.points.is_empty() {
        return StressOutcome {
            scenario: scenario.name().to_string(),
            summary: PerformanceSummary::empty(),
        };
    }
    let dates: Vec<NaiveDate> = run.points.iter().map(|p| p.date).collect();
    let returns: Vec<f64> = run.points.iter().skip(1).map(|p| p.period_return).collect();
    let stressed = scenario.apply(&returns);
    let curve = rebuild_curve(&dates, run.points[0].equity, &stressed);
    StressOutcome {
        scenario: scenario.name().to_string(),
        summary: PerformanceSummary::compute(&curve, periods_per_year, risk_free_rate),
    }
}

/// The three-scenario suite run by default: a one-day crash, a seeded
/// volatility storm, and a slow bear market.
pub fn standard_suite(seed: u64) -> Vec<StressScenario> {
    vec![
        StressScenario::CrashShock {
            shock: -0.25,
            at_period: 5,
        },
        StressScenario::VolatilityStorm { sigma: 0.03, seed },
        StressScenario::ProlongedBear {
            total_decline: -0.40,
        },
    ]
}

/// Run the standard suite against a completed run.
pub fn run_standard_suite(
    run: &BacktestRun,
    periods_per_year: f64,
    risk_free_rate: f64,
    seed: u64,
) -> Vec<StressOutcome> {
    standard_suite(seed)
        .iter()
        .map(|s| run_scenario(run, s, periods_per_year, risk_free_rate))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RebalanceReport;

    fn fake_run(returns: &[f64]) -> BacktestRun {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..=returns.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        let points = rebuild_curve(&dates, 100_000.0, returns);
        let summary = PerformanceSummary::compute(&points, 252.0, 0.0);
        BacktestRun {
            run_id: String::from("test"),
            points,
            summary,
            rebalances: Vec::<RebalanceReport>::new(),
        }
    }

    #[test]
    fn crash_shock_hits_exactly_one_period() {
        let returns = vec![0.01; 10];
        let shocked = StressScenario::CrashShock {
            shock: -0.25,
            at_period: 5,
        }
        .apply(&returns);
        assert_eq!(shocked.len(), 10);
        for (i, &r) in shocked.iter().enumerate() {
            if i == 5 {
                assert!((r - (1.01 * 0.75 - 1.0)).abs() < 1e-12);
            } else {
                assert_eq!(r, 0.01);
            }
        }
    }

    #[test]
    fn crash_shock_out_of_range_is_a_no_op() {
        let returns = vec![0.01; 3];
        let shocked = StressScenario::CrashShock {
            shock: -0.25,
            at_period: 99,
        }
        .apply(&returns);
        assert_eq!(shocked, returns);
    }

    #[test]
    fn volatility_storm_is_deterministic_per_seed() {
        let returns = vec![0.002; 50];
        let storm = |seed| StressScenario::VolatilityStorm { sigma: 0.03, seed };
        assert_eq!(storm(42).apply(&returns), storm(42).apply(&returns));
        assert_ne!(storm(42).apply(&returns), storm(43).apply(&returns));
    }

    #[test]
    fn volatility_storm_raises_measured_volatility() {
        let run = fake_run(&vec![0.001; 100]);
        let base = run.summary.volatility;
        let stressed = run_scenario(
            &run,
            &StressScenario::VolatilityStorm {
                sigma: 0.03,
                seed: 7,
            },
            252.0,
            0.0,
        );
        assert!(stressed.summary.volatility > base);
    }

    #[test]
    fn prolonged_bear_drags_total_return_down() {
        let run = fake_run(&vec![0.0; 50]);
        let stressed = run_scenario(
            &run,
            &StressScenario::ProlongedBear {
                total_decline: -0.40,
            },
            252.0,
            0.0,
        );
        // A flat run overlaid with a -40% bear ends down exactly 40%.
        assert!((stressed.summary.total_return - (-0.40)).abs() < 1e-9);
        assert!(stressed.summary.max_drawdown <= -0.40 + 1e-9);
    }

    #[test]
    fn empty_run_produces_empty_summary() {
        let run = fake_run(&[]);
        // One opening point, zero periods.
        let out = run_scenario(
            &run,
            &StressScenario::ProlongedBear {
                total_decline: -0.40,
            },
            252.0,
            0.0,
        );
        assert_eq!(out.summary.periods, 0);
    }

    #[test]
    fn standard_suite_covers_all_three() {
        let run = fake_run(&vec![0.001; 30]);
        let outcomes = run_standard_suite(&run, 252.0, 0.0, 11);
        let names: Vec<&str> = outcomes.iter().map(|o| o.scenario.as_str()).collect();
        assert_eq!(names, vec!["crash_shock", "volatility_storm", "prolonged_bear"]);
        for o in &outcomes {
            assert!(o.summary.final_equity.is_finite());
        }
    }

    #[test]
    fn suite_is_reproducible() {
        let run = fake_run(&vec![0.002; 40]);
        let a = run_standard_suite(&run, 252.0, 0.0, 99);
        let b = run_standard_suite(&run, 252.0, 0.0, 99);
        assert_eq!(a, b);
    }
}
