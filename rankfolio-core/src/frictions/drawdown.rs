//! Drawdown-based exposure scaling.
//!
//! Exposure is a step function of the running portfolio drawdown. The
//! multiplier scales realized return, not weights — de-risking without an
//! explicit rebalance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One rung of the ladder: at or below `threshold`, exposure drops to
/// `multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LadderStep {
    /// Drawdown threshold, negative (e.g. -0.05).
    pub threshold: f64,
    /// Exposure multiplier in (0, 1].
    pub multiplier: f64,
}

#[derive(Debug, Error)]
pub enum LadderError {
    #[error("ladder threshold {0} must be negative")]
    NonNegativeThreshold(f64),
    #[error("ladder multiplier {0} must be in (0, 1]")]
    MultiplierOutOfRange(f64),
    #[error("ladder thresholds must be strictly decreasing (found {0} after {1})")]
    NotDecreasing(f64, f64),
}

/// Validated drawdown ladder. An empty ladder means exposure is always 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownLadder {
    steps: Vec<LadderStep>,
}

impl Default for DrawdownLadder {
    /// The standard institutional ladder: -5% → 75%, -8% → 50%, -12% → 20%.
    fn default() -> Self {
        Self {
            steps: vec![
                LadderStep {
                    threshold: -0.05,
                    multiplier: 0.75,
                },
                LadderStep {
                    threshold: -0.08,
                    multiplier: 0.50,
                },
                LadderStep {
                    threshold: -0.12,
                    multiplier: 0.20,
                },
            ],
        }
    }
}

impl DrawdownLadder {
    /// Build a ladder from shallowest to deepest rung.
    pub fn new(steps: Vec<LadderStep>) -> Result<Self, LadderError> {
        for pair in steps.windows(2) {
            if pair[1].threshold >= pair[0].threshold {
                return Err(LadderError::NotDecreasing(pair[1].threshold, pair[0].threshold));
            }
        }
        for step in &steps {
            if step.threshold >= 0.0 {
                return Err(LadderError::NonNegativeThreshold(step.threshold));
            }
            if !(step.multiplier > 0.0 && step.multiplier <= 1.0) {
                return Err(LadderError::MultiplierOutOfRange(step.multiplier));
            }
        }
        Ok(Self { steps })
    }

    /// Ladder that never de-risks.
    pub fn disabled() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn steps(&self) -> &[LadderStep] {
        &self.steps
    }

    /// Map a running drawdown (≤ 0) to an exposure multiplier.
    ///
    /// The deepest rung whose threshold the drawdown has reached wins;
    /// above the first rung the multiplier is 1.0.
    pub fn multiplier_for(&self, drawdown: f64) -> f64 {
        for step in self.steps.iter().rev() {
            if drawdown <= step.threshold {
                return step.multiplier;
            }
        }
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ladder_rungs() {
        let ladder = DrawdownLadder::default();
        assert_eq!(ladder.multiplier_for(0.0), 1.0);
        assert_eq!(ladder.multiplier_for(-0.03), 1.0);
        assert_eq!(ladder.multiplier_for(-0.05), 0.75);
        assert_eq!(ladder.multiplier_for(-0.07), 0.75);
        assert_eq!(ladder.multiplier_for(-0.08), 0.50);
        assert_eq!(ladder.multiplier_for(-0.10), 0.50);
        assert_eq!(ladder.multiplier_for(-0.12), 0.20);
        assert_eq!(ladder.multiplier_for(-0.50), 0.20);
    }

    #[test]
    fn exact_threshold_takes_the_rung() {
        // -5% drawdown is already de-risked, not still fully exposed.
        let ladder = DrawdownLadder::default();
        assert_eq!(ladder.multiplier_for(-0.05), 0.75);
    }

    #[test]
    fn disabled_ladder_always_full_exposure() {
        let ladder = DrawdownLadder::disabled();
        assert_eq!(ladder.multiplier_for(-0.99), 1.0);
    }

    #[test]
    fn rejects_non_decreasing_thresholds() {
        let err = DrawdownLadder::new(vec![
            LadderStep {
                threshold: -0.08,
                multiplier: 0.5,
            },
            LadderStep {
                threshold: -0.05,
                multiplier: 0.75,
            },
        ])
        .unwrap_err();
        assert!(matches!(err, LadderError::NotDecreasing(..)));
    }

    #[test]
    fn rejects_positive_threshold() {
        let err = DrawdownLadder::new(vec![LadderStep {
            threshold: 0.05,
            multiplier: 0.75,
        }])
        .unwrap_err();
        assert!(matches!(err, LadderError::NonNegativeThreshold(_)));
    }

    #[test]
    fn rejects_zero_multiplier() {
        let err = DrawdownLadder::new(vec![LadderStep {
            threshold: -0.05,
            multiplier: 0.0,
        }])
        .unwrap_err();
        assert!(matches!(err, LadderError::MultiplierOutOfRange(_)));
    }

    #[test]
    fn multiplier_is_monotone_in_drawdown() {
        let ladder = DrawdownLadder::default();
        let mut prev = f64::INFINITY;
        for i in 0..200 {
            let dd = -(i as f64) * 0.001;
            let m = ladder.multiplier_for(dd);
            assert!(m <= prev, "multiplier rose as drawdown deepened");
            prev = m;
        }
    }
}
