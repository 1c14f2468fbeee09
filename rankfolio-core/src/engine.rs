//! The simulation loop — single-threaded, sequential, deterministic.
//!
//! One period at a time: accrue the return of the held weights, scale it by
//! the drawdown ladder's exposure multiplier, and on rebalance dates push the
//! held portfolio through construction, governance, and the liquidity/cost
//! overlays. Scoring is the only parallel stage and is precomputed up front;
//! everything that touches equity state runs in calendar order.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analytics::PerformanceSummary;
use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::construct::construct;
use crate::domain::{EquityPoint, PricePanel, WeightVector, WEIGHT_EPSILON};
use crate::schedule::build_schedule;
use crate::score::{score_table, ScoreSet};

/// Per-rebalance execution diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceReport {
    pub date: NaiveDate,
    /// Names in the post-governance target.
    pub selected: usize,
    /// Realized turnover against the pre-trade held weights.
    pub turnover: f64,
    pub transaction_cost: f64,
    pub slippage_cost: f64,
    /// Trades truncated by the liquidity participation cap.
    pub capped_trades: usize,
}

/// Completed backtest: the curve, its summary, and the rebalance log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRun {
    pub run_id: RunId,
    pub points: Vec<EquityPoint>,
    pub summary: PerformanceSummary,
    pub rebalances: Vec<RebalanceReport>,
}

/// Resumable simulation over a panel.
///
/// `step()` advances exactly one period and leaves the curve in a valid
/// state, so a caller can stop between periods and still hold a meaningful
/// partial result.
pub struct Simulation<'p> {
    panel: &'p PricePanel,
    config: BacktestConfig,
    /// Score cross-sections keyed by rebalance date, precomputed in parallel.
    scores: HashMap<NaiveDate, ScoreSet>,
    cursor: usize,
    equity: f64,
    peak: f64,
    held: WeightVector,
    points: Vec<EquityPoint>,
    rebalances: Vec<RebalanceReport>,
}

impl<'p> Simulation<'p> {
    /// Validate the config, derive the rebalance schedule, and precompute
    /// score cross-sections for every scheduled date.
    pub fn new(panel: &'p PricePanel, config: BacktestConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let schedule = build_schedule(panel.dates(), config.cadence);
        let scores = score_table(panel, &config.scoring, &schedule)
            .into_iter()
            .map(|set| (set.date, set))
            .collect();

        Ok(Self {
            panel,
            equity: config.initial_capital,
            peak: config.initial_capital,
            config,
            scores,
            cursor: 0,
            held: WeightVector::new(),
            points: Vec::new(),
            rebalances: Vec::new(),
        })
    }

    pub fn is_finished(&self) -> bool {
        // A panel with a single date has nothing to simulate.
        self.panel.dates().len() < 2 || self.cursor >= self.panel.dates().len()
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    pub fn held_weights(&self) -> &WeightVector {
        &self.held
    }

    /// Advance one period; `None` once the calendar is exhausted.
    pub fn step(&mut self) -> Option<EquityPoint> {
        if self.is_finished() {
            return None;
        }
        let date = self.panel.dates()[self.cursor];
        let equity_before = self.equity;

        // 1. Accrue the held portfolio's return. Instruments missing a price
        //    this period contribute zero — fail-soft on sparse data.
        let gross: f64 = if self.cursor == 0 {
            0.0
        } else {
            self.held
                .iter()
                .map(|(inst, w)| w * self.panel.simple_return(inst, date).unwrap_or(0.0))
                .sum()
        };

        // 2. Scale realized return by the exposure multiplier implied by the
        //    drawdown entering this period. Weights are untouched.
        let multiplier = self
            .points
            .last()
            .map(|p| self.config.ladder.multiplier_for(p.drawdown))
            .unwrap_or(1.0);
        self.equity *= 1.0 + gross * multiplier;

        // 3. Recompose on schedule; costs hit equity only here.
        if let Some(set) = self.scores.get(&date).cloned() {
            let report = self.rebalance(&set, date);
            self.equity -= report.transaction_cost + report.slippage_cost;
            self.rebalances.push(report);
        }

        if self.equity > self.peak {
            self.peak = self.equity;
        }
        let point = EquityPoint {
            date,
            equity: self.equity,
            period_return: if self.cursor == 0 {
                0.0
            } else {
                self.equity / equity_before - 1.0
            },
            drawdown: if self.peak > 0.0 {
                self.equity / self.peak - 1.0
            } else {
                0.0
            },
        };
        self.points.push(point);
        self.cursor += 1;
        Some(point)
    }

    /// Construct → govern → execute against liquidity, updating held weights
    /// in place and returning the diagnostics for this date.
    fn rebalance(&mut self, scores: &ScoreSet, date: NaiveDate) -> RebalanceReport {
        let target = construct(
            scores,
            self.panel,
            self.config.sizing,
            self.config.max_weight,
            self.config.top_n,
        );
        let governed = self.config.governor.govern(&self.held, &target);

        let mut next = self.held.clone();
        let mut transaction_cost = 0.0;
        let mut slippage_cost = 0.0;
        let mut capped_trades = 0usize;

        for key in self.held.union_keys(&governed) {
            let delta = governed.get(key) - self.held.get(key);
            if delta.abs() < WEIGHT_EPSILON {
                continue;
            }
            let adv = self
                .panel
                .average_daily_value(key, date, self.config.liquidity.adv_window);
            let trade = self.config.liquidity.execute(delta.abs() * self.equity, adv);

            let executed_delta = delta.signum() * trade.executed_notional / self.equity;
            let w = next.get(key) + executed_delta;
            next.set(key, if w.abs() < WEIGHT_EPSILON { 0.0 } else { w });

            transaction_cost += self
                .config
                .costs
                .cost_for(delta.signum() * trade.executed_notional);
            slippage_cost += trade.slippage_cost;
            if trade.capped {
                capped_trades += 1;
            }
        }
        // Capped sells alongside full buys can nudge the sum past the budget.
        next.cap_gross_exposure();

        let turnover = self.held.turnover(&next);
        self.held = next;
        RebalanceReport {
            date,
            selected: governed.len(),
            turnover,
            transaction_cost,
            slippage_cost,
            capped_trades,
        }
    }

    /// Run any remaining periods and close out the run.
    pub fn finish(mut self) -> BacktestRun {
        while self.step().is_some() {}
        let summary = if self.points.is_empty() {
            PerformanceSummary::empty()
        } else {
            PerformanceSummary::compute(
                &self.points,
                self.config.periods_per_year,
                self.config.risk_free_rate,
            )
        };
        BacktestRun {
            run_id: self.config.run_id(),
            points: self.points,
            summary,
            rebalances: self.rebalances,
        }
    }
}

/// Run a full backtest in one call.
pub fn run_backtest(panel: &PricePanel, config: BacktestConfig) -> Result<BacktestRun, ConfigError> {
    Ok(Simulation::new(panel, config)?.finish())
}
