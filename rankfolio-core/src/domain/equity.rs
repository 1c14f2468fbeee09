//! Equity curve points.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One period of the simulated equity curve.
///
/// The sequence is append-only and rebuilt wholesale on every run; points are
/// never edited after being pushed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
    /// Net return realized over this period (0.0 for the opening point).
    pub period_return: f64,
    /// equity / running_peak - 1; always ≤ 0, exactly 0 at a running maximum.
    pub drawdown: f64,
}

/// Extract the raw equity values from a curve.
pub fn equity_values(points: &[EquityPoint]) -> Vec<f64> {
    points.iter().map(|p| p.equity).collect()
}

/// Running drawdown series for a plain equity path.
pub fn drawdown_series(equity: &[f64]) -> Vec<f64> {
    let mut peak = f64::MIN;
    equity
        .iter()
        .map(|&e| {
            if e > peak {
                peak = e;
            }
            if peak > 0.0 {
                e / peak - 1.0
            } else {
                0.0
            }
        })
        .collect()
}
