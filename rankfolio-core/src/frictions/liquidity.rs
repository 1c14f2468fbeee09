//! Liquidity participation cap and size-scaled slippage.
//!
//! A trade may consume at most `max_participation` of an instrument's
//! trailing average daily traded value. Demand beyond the cap is simply not
//! executed that period (partial fill); slippage cost scales with how much
//! of the cap the executed notional consumes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquidityModel {
    /// Maximum fraction of trailing ADV a single trade may consume.
    pub max_participation: f64,
    /// Slippage at full cap utilization, as a fraction of executed notional.
    pub base_slippage: f64,
    /// Trailing window (observations) for the ADV estimate.
    pub adv_window: usize,
}

impl Default for LiquidityModel {
    fn default() -> Self {
        Self {
            max_participation: 0.10,
            base_slippage: 0.0005,
            adv_window: 20,
        }
    }
}

/// Outcome of pushing one desired trade through the liquidity model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutedTrade {
    pub desired_notional: f64,
    pub executed_notional: f64,
    pub slippage_cost: f64,
    /// True when the participation cap truncated the trade.
    pub capped: bool,
}

impl LiquidityModel {
    pub fn frictionless() -> Self {
        Self {
            max_participation: 1.0,
            base_slippage: 0.0,
            adv_window: 20,
        }
    }

    /// Execute a desired (unsigned) notional against an ADV estimate.
    ///
    /// `adv = None` means no volume data exists for the instrument: the trade
    /// is unconstrained and slippage-free by the explicit zero-result rule.
    /// An ADV of zero means no liquidity at all — nothing executes.
    pub fn execute(&self, desired_notional: f64, adv: Option<f64>) -> ExecutedTrade {
        debug_assert!(desired_notional >= 0.0);

        let Some(adv) = adv else {
            return ExecutedTrade {
                desired_notional,
                executed_notional: desired_notional,
                slippage_cost: 0.0,
                capped: false,
            };
        };

        let cap = adv * self.max_participation;
        if cap <= 0.0 {
            return ExecutedTrade {
                desired_notional,
                executed_notional: 0.0,
                slippage_cost: 0.0,
                capped: desired_notional > 0.0,
            };
        }

        let executed = desired_notional.min(cap);
        let utilization = (executed / cap).min(1.0);
        ExecutedTrade {
            desired_notional,
            executed_notional: executed,
            slippage_cost: executed * self.base_slippage * utilization,
            capped: desired_notional > cap,
        }
    }
}
