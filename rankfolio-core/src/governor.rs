//! Turnover governance — smooths the transition from held to target weights.
//!
//! Two steps, applied in order:
//! 1. Threshold filter: sub-`min_change` moves keep the previous weight, so
//!    noise-level rebalances don't generate trades.
//! 2. Turnover cap: when the remaining move exceeds `max_turnover`, the move
//!    (not the destination) is scaled by `cap / turnover` — a partial
//!    rebalance that catches up over subsequent periods.

use serde::{Deserialize, Serialize};

use crate::domain::WeightVector;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnoverGovernor {
    /// Weight changes smaller than this are suppressed entirely.
    pub min_change: f64,
    /// Upper bound on per-step turnover (½·Σ|Δweight|).
    pub max_turnover: f64,
}

impl Default for TurnoverGovernor {
    fn default() -> Self {
        Self {
            min_change: 0.01,
            max_turnover: 0.30,
        }
    }
}

impl TurnoverGovernor {
    /// Produce the held weights for the next period.
    ///
    /// The result always satisfies: entries ≥ 0, sum ≤ 1, and
    /// `prev.turnover(result) ≤ max_turnover` (up to float tolerance).
    pub fn govern(&self, prev: &WeightVector, target: &WeightVector) -> WeightVector {
        let filtered = self.apply_threshold(prev, target);
        self.apply_turnover_cap(prev, &filtered)
    }

    /// Step 1: ignore tiny changes that would create unnecessary trades.
    fn apply_threshold(&self, prev: &WeightVector, target: &WeightVector) -> WeightVector {
        let mut adjusted = WeightVector::new();
        for key in prev.union_keys(target) {
            let p = prev.get(key);
            let t = target.get(key);
            let kept = if (t - p).abs() < self.min_change { p } else { t };
            adjusted.set(key, kept);
        }
        // Keeping stale entries can push the sum past the budget; scale down
        // if so, never up.
        adjusted.cap_gross_exposure();
        adjusted
    }

    /// Step 2: interpolate between prev and target when the move is too big.
    fn apply_turnover_cap(&self, prev: &WeightVector, target: &WeightVector) -> WeightVector {
        let turnover = prev.turnover(target);
        if turnover <= self.max_turnover {
            return target.clone();
        }

        let scale = self.max_turnover / turnover;
        let mut held = WeightVector::new();
        for key in prev.union_keys(target) {
            let p = prev.get(key);
            let t = target.get(key);
            let w = p + (t - p) * scale;
            if w > 0.0 {
                held.set(key, w);
            }
        }
        held.cap_gross_exposure();
        held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wv(pairs: &[(&str, f64)]) -> WeightVector {
        WeightVector::from_pairs(pairs.iter().map(|&(k, v)| (k, v)))
    }

    #[test]
    fn small_changes_are_suppressed() {
        let gov = TurnoverGovernor {
            min_change: 0.02,
            max_turnover: 1.0,
        };
        let prev = wv(&[("A", 0.50), ("B", 0.50)]);
        let target = wv(&[("A", 0.51), ("B", 0.49)]);
        let held = gov.govern(&prev, &target);
        assert_eq!(held, prev);
    }

    #[test]
    fn large_changes_pass_threshold() {
        let gov = TurnoverGovernor {
            min_change: 0.02,
            max_turnover: 1.0,
        };
        let prev = wv(&[("A", 0.50), ("B", 0.50)]);
        let target = wv(&[("A", 0.60), ("B", 0.40)]);
        let held = gov.govern(&prev, &target);
        assert_eq!(held, target);
    }

    #[test]
    fn turnover_cap_interpolates_the_move() {
        let gov = TurnoverGovernor {
            min_change: 0.01,
            max_turnover: 0.10,
        };
        let prev = wv(&[("A", 0.5), ("B", 0.5)]);
        let target = wv(&[("A", 0.9), ("B", 0.1)]);
        let held = gov.govern(&prev, &target);
        // Turnover of the full move is 0.4; scale = 0.25.
        assert!((held.get("A") - 0.6).abs() < 1e-12);
        assert!((held.get("B") - 0.4).abs() < 1e-12);
        assert!((prev.turnover(&held) - 0.10).abs() < 1e-12);
    }

    #[test]
    fn cap_binds_when_exiting_to_cash() {
        let gov = TurnoverGovernor {
            min_change: 0.0,
            max_turnover: 0.25,
        };
        let prev = wv(&[("A", 0.5), ("B", 0.5)]);
        let target = WeightVector::new();
        let held = gov.govern(&prev, &target);
        assert!((prev.turnover(&held) - 0.25).abs() < 1e-9);
        assert!(held.is_valid());
    }

    #[test]
    fn cap_binds_when_entering_from_cash() {
        let gov = TurnoverGovernor {
            min_change: 0.0,
            max_turnover: 0.20,
        };
        let prev = WeightVector::new();
        let target = wv(&[("A", 0.5), ("B", 0.5)]);
        let held = gov.govern(&prev, &target);
        assert!((prev.turnover(&held) - 0.20).abs() < 1e-9);
        assert!((held.gross_exposure() - 0.40).abs() < 1e-9);
    }

    #[test]
    fn within_cap_moves_straight_to_target() {
        let gov = TurnoverGovernor::default();
        let prev = wv(&[("A", 0.5), ("B", 0.5)]);
        let target = wv(&[("A", 0.6), ("B", 0.4)]);
        let held = gov.govern(&prev, &target);
        assert_eq!(held, target);
    }

    #[test]
    fn governed_result_is_always_valid() {
        let gov = TurnoverGovernor {
            min_change: 0.01,
            max_turnover: 0.15,
        };
        let prev = wv(&[("A", 0.4), ("B", 0.3), ("C", 0.3)]);
        let target = wv(&[("C", 0.2), ("D", 0.4), ("E", 0.4)]);
        let held = gov.govern(&prev, &target);
        assert!(held.is_valid());
        assert!(prev.turnover(&held) <= 0.15 + 1e-9);
    }

    #[test]
    fn repeated_governing_converges_toward_target() {
        let gov = TurnoverGovernor {
            min_change: 0.0,
            max_turnover: 0.10,
        };
        let target = wv(&[("A", 0.9), ("B", 0.1)]);
        let mut held = wv(&[("A", 0.5), ("B", 0.5)]);
        for _ in 0..4 {
            held = gov.govern(&held, &target);
        }
        // Four capped steps of 0.10 each close the 0.4 gap completely.
        assert!((held.get("A") - 0.9).abs() < 1e-9);
    }
}
