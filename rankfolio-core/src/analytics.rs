//! Performance analytics — pure functions over a completed equity curve.
//!
//! Every metric is equity curve in, scalar out; nothing here reads the
//! panel, the config (beyond annualization inputs), or simulation state.

use serde::{Deserialize, Serialize};

use crate::domain::EquityPoint;
use crate::stats::{mean, sample_std};

/// Aggregate risk/return statistics for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub cagr: f64,
    /// Annualized standard deviation of period returns.
    pub volatility: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    /// Number of simulated periods (0 for a degenerate run).
    pub periods: usize,
    pub final_equity: f64,
}

impl PerformanceSummary {
    /// Compute the summary from a completed curve.
    ///
    /// An empty curve reports zero periods and all-zero metrics — the
    /// well-defined outcome of a panel with fewer than two usable dates.
    pub fn compute(points: &[EquityPoint], periods_per_year: f64, risk_free_rate: f64) -> Self {
        let equity: Vec<f64> = points.iter().map(|p| p.equity).collect();
        let returns: Vec<f64> = points.iter().skip(1).map(|p| p.period_return).collect();
        Self {
            total_return: total_return(&equity),
            cagr: cagr(&equity, periods_per_year),
            volatility: annualized_volatility(&returns, periods_per_year),
            sharpe: sharpe_ratio(&returns, periods_per_year, risk_free_rate),
            max_drawdown: max_drawdown(&equity),
            periods: points.len().saturating_sub(1),
            final_equity: equity.last().copied().unwrap_or(0.0),
        }
    }

    /// Summary for a run that never got off the ground.
    pub fn empty() -> Self {
        Self {
            total_return: 0.0,
            cagr: 0.0,
            volatility: 0.0,
            sharpe: 0.0,
            max_drawdown: 0.0,
            periods: 0,
            final_equity: 0.0,
        }
    }
}

/// Total return as a fraction of starting equity.
pub fn total_return(equity: &[f64]) -> f64 {
    if equity.len() < 2 {
        return 0.0;
    }
    let initial = equity[0];
    if initial <= 0.0 {
        return 0.0;
    }
    equity[equity.len() - 1] / initial - 1.0
}

/// Compound annual growth rate: (end/start)^(periods_per_year / n) - 1.
pub fn cagr(equity: &[f64], periods_per_year: f64) -> f64 {
    if equity.len() < 2 {
        return 0.0;
    }
    let initial = equity[0];
    let final_eq = equity[equity.len() - 1];
    if initial <= 0.0 || final_eq <= 0.0 {
        return 0.0;
    }
    let n = (equity.len() - 1) as f64;
    (final_eq / initial).powf(periods_per_year / n) - 1.0
}

/// Annualized volatility of period returns.
pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    sample_std(returns) * periods_per_year.sqrt()
}

/// Annualized Sharpe ratio; defined as 0 when volatility is 0.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64, risk_free_rate: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let vol = annualized_volatility(returns, periods_per_year);
    if vol < 1e-15 {
        return 0.0;
    }
    (mean(returns) * periods_per_year - risk_free_rate) / vol
}

/// Maximum drawdown as a negative fraction (e.g. -0.15 for a 15% decline).
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &e in equity {
        if e > peak {
            peak = e;
        }
        if peak > 0.0 {
            let dd = e / peak - 1.0;
            if dd < worst {
                worst = dd;
            }
        }
    }
    worst
}
