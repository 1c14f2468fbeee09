//! Backtest configuration — one immutable value passed into the entry point.
//!
//! Every knob lives here with an explicit default; nothing in the engine
//! reads ambient or module-level configuration. `validate()` enforces the
//! fatal error taxonomy: bad configuration aborts a run, while data sparsity
//! never does.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::construct::SizingRule;
use crate::frictions::drawdown::LadderError;
use crate::frictions::{DrawdownLadder, LiquidityModel, TransactionCostModel};
use crate::governor::TurnoverGovernor;
use crate::schedule::RebalanceCadence;
use crate::score::ScoringRule;

/// Content-addressable id of a run configuration.
pub type RunId = String;

/// Fatal configuration errors, surfaced before any simulation starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("initial capital must be positive, got {0}")]
    NonPositiveCapital(f64),
    #[error("portfolio size (top_n) must be at least 1")]
    ZeroPortfolioSize,
    #[error("max per-name weight must be in (0, 1], got {0}")]
    MaxWeightOutOfRange(f64),
    #[error("turnover cap must be in (0, 1], got {0}")]
    TurnoverCapOutOfRange(f64),
    #[error("minimum weight change must be in [0, 1), got {0}")]
    MinChangeOutOfRange(f64),
    #[error("liquidity participation cap must be in (0, 1], got {0}")]
    ParticipationOutOfRange(f64),
    #[error("cost/slippage rate must be non-negative, got {0}")]
    NegativeRate(f64),
    #[error("scoring lookback windows must be at least 1")]
    ZeroLookback,
    #[error("volatility window must be at least 2")]
    VolatilityWindowTooShort,
    #[error("periods per year must be positive, got {0}")]
    NonPositivePeriodsPerYear(f64),
    #[error("invalid drawdown ladder: {0}")]
    Ladder(#[from] LadderError),
}

/// Full parameterization of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub scoring: ScoringRule,
    pub sizing: SizingRule,
    pub cadence: RebalanceCadence,
    /// Number of names selected at each rebalance.
    pub top_n: usize,
    /// Per-name weight ceiling.
    pub max_weight: f64,
    pub governor: TurnoverGovernor,
    pub costs: TransactionCostModel,
    pub liquidity: LiquidityModel,
    pub ladder: DrawdownLadder,
    pub initial_capital: f64,
    /// Annualization factor for the analytics layer (252 for daily panels).
    pub periods_per_year: f64,
    /// Annual risk-free rate used in the Sharpe computation.
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringRule::default(),
            sizing: SizingRule::default(),
            cadence: RebalanceCadence::default(),
            top_n: 15,
            max_weight: 0.10,
            governor: TurnoverGovernor::default(),
            costs: TransactionCostModel::default(),
            liquidity: LiquidityModel::default(),
            ladder: DrawdownLadder::default(),
            initial_capital: 100_000.0,
            periods_per_year: 252.0,
            risk_free_rate: 0.0,
        }
    }
}

impl BacktestConfig {
    /// A frictionless variant used heavily in tests: no costs, no slippage,
    /// no liquidity cap, no de-risking, no churn suppression.
    pub fn frictionless() -> Self {
        Self {
            governor: TurnoverGovernor {
                min_change: 0.0,
                max_turnover: 1.0,
            },
            costs: TransactionCostModel::frictionless(),
            liquidity: LiquidityModel::frictionless(),
            ladder: DrawdownLadder::disabled(),
            ..Self::default()
        }
    }

    /// Check every fatal precondition. Data-dependent conditions (sparse
    /// history, empty cross-sections) are not errors and are handled
    /// downstream.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_capital > 0.0) {
            return Err(ConfigError::NonPositiveCapital(self.initial_capital));
        }
        if self.top_n == 0 {
            return Err(ConfigError::ZeroPortfolioSize);
        }
        if !(self.max_weight > 0.0 && self.max_weight <= 1.0) {
            return Err(ConfigError::MaxWeightOutOfRange(self.max_weight));
        }
        if !(self.governor.max_turnover > 0.0 && self.governor.max_turnover <= 1.0) {
            return Err(ConfigError::TurnoverCapOutOfRange(self.governor.max_turnover));
        }
        if !(self.governor.min_change >= 0.0 && self.governor.min_change < 1.0) {
            return Err(ConfigError::MinChangeOutOfRange(self.governor.min_change));
        }
        if !(self.liquidity.max_participation > 0.0 && self.liquidity.max_participation <= 1.0) {
            return Err(ConfigError::ParticipationOutOfRange(
                self.liquidity.max_participation,
            ));
        }
        for rate in [
            self.costs.buy_rate,
            self.costs.sell_rate,
            self.liquidity.base_slippage,
        ] {
            if rate < 0.0 {
                return Err(ConfigError::NegativeRate(rate));
            }
        }
        if !(self.periods_per_year > 0.0) {
            return Err(ConfigError::NonPositivePeriodsPerYear(self.periods_per_year));
        }
        self.validate_scoring()?;
        // Ladders built through `DrawdownLadder::new` are already valid, but
        // deserialized configs bypass the constructor.
        DrawdownLadder::new(self.ladder.steps().to_vec())?;
        Ok(())
    }

    fn validate_scoring(&self) -> Result<(), ConfigError> {
        match self.scoring {
            ScoringRule::Momentum { lookback, .. } => {
                if lookback == 0 {
                    return Err(ConfigError::ZeroLookback);
                }
            }
            ScoringRule::MeanReversion {
                lookback,
                vol_window,
            } => {
                if lookback == 0 {
                    return Err(ConfigError::ZeroLookback);
                }
                if matches!(vol_window, Some(w) if w < 2) {
                    return Err(ConfigError::VolatilityWindowTooShort);
                }
            }
            ScoringRule::BlendedFactor {
                momentum_window,
                reversal_window,
                vol_window,
            } => {
                if momentum_window == 0 || reversal_window == 0 {
                    return Err(ConfigError::ZeroLookback);
                }
                if vol_window < 2 {
                    return Err(ConfigError::VolatilityWindowTooShort);
                }
            }
        }
        match self.sizing {
            SizingRule::InverseVolatility { vol_window }
            | SizingRule::RiskParity { vol_window } => {
                if vol_window < 2 {
                    return Err(ConfigError::VolatilityWindowTooShort);
                }
            }
            SizingRule::EqualWeight => {}
        }
        Ok(())
    }

    /// Deterministic content hash of this configuration.
    ///
    /// Two identical configs share a run id, so artifact stores can detect
    /// re-runs of the same experiment.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("BacktestConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
