//! Flat percentage transaction costs, asymmetric by side.
//!
//! Cost is charged on the changed portion of a position only — holding a
//! name across a rebalance costs nothing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransactionCostModel {
    /// Fractional cost on bought notional (e.g. 0.00083 = 8.3 bps).
    pub buy_rate: f64,
    /// Fractional cost on sold notional. Sells typically cost more
    /// (stamp duties, exit taxes), hence the asymmetry.
    pub sell_rate: f64,
}

impl Default for TransactionCostModel {
    fn default() -> Self {
        Self {
            buy_rate: 0.00083,
            sell_rate: 0.00183,
        }
    }
}

impl TransactionCostModel {
    pub fn frictionless() -> Self {
        Self {
            buy_rate: 0.0,
            sell_rate: 0.0,
        }
    }

    /// Cost of one signed trade. `delta_notional` > 0 buys, < 0 sells.
    pub fn cost_for(&self, delta_notional: f64) -> f64 {
        if delta_notional > 0.0 {
            delta_notional * self.buy_rate
        } else {
            -delta_notional * self.sell_rate
        }
    }
}
