//! Portfolio construction — scores in, target weight vector out.
//!
//! Selection is rank-based top-N over the cross-section; weighting is a
//! closed set of sizing rules. Degenerate cross-sections degrade gracefully:
//! fewer eligible names than `top_n` uses all of them, zero eligible names
//! yields the all-cash vector.

use serde::{Deserialize, Serialize};

use crate::domain::{PricePanel, WeightVector};
use crate::score::{ScoreSet, VOL_EPSILON};

/// How selected names are sized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SizingRule {
    /// 1/k for each of the k selected names.
    EqualWeight,

    /// Weight proportional to 1/(σ + ε) from trailing realized volatility.
    InverseVolatility { vol_window: usize },

    /// Simplified risk parity: the inverse-volatility formula restricted to
    /// the selected subset. Kept as its own variant so configurations state
    /// their intent.
    RiskParity { vol_window: usize },
}

impl Default for SizingRule {
    fn default() -> Self {
        SizingRule::EqualWeight
    }
}

/// Build the target weight vector for one rebalance date.
///
/// The cross-section in `scores` is already ranked best-first; the top
/// `top_n` eligible names are selected. Raw weights are normalized to sum
/// to 1, then each is clipped to `max_weight` — the clipped excess stays in
/// cash rather than being pushed onto other names, so no single name can
/// breach the cap.
pub fn construct(
    scores: &ScoreSet,
    panel: &PricePanel,
    sizing: SizingRule,
    max_weight: f64,
    top_n: usize,
) -> WeightVector {
    let selected: Vec<&str> = scores
        .records
        .iter()
        .take(top_n)
        .map(|r| r.instrument.as_str())
        .collect();

    if selected.is_empty() || top_n == 0 {
        return WeightVector::new();
    }

    let raw: Vec<f64> = match sizing {
        SizingRule::EqualWeight => vec![1.0; selected.len()],
        SizingRule::InverseVolatility { vol_window }
        | SizingRule::RiskParity { vol_window } => {
            inverse_vol_raw(&selected, panel, scores, vol_window)
        }
    };

    let total: f64 = raw.iter().sum();
    if total <= 0.0 {
        return WeightVector::new();
    }

    let mut weights = WeightVector::new();
    for (instrument, r) in selected.iter().zip(&raw) {
        let w = (r / total).min(max_weight);
        weights.set(*instrument, w);
    }
    weights
}

/// Raw inverse-volatility weights for the selected names.
///
/// Names whose volatility estimate is unavailable (window longer than the
/// scoring lookback) borrow the mean volatility of the names that have one;
/// if no estimate exists at all, sizing falls back to equal weight.
fn inverse_vol_raw(
    selected: &[&str],
    panel: &PricePanel,
    scores: &ScoreSet,
    vol_window: usize,
) -> Vec<f64> {
    let vols: Vec<Option<f64>> = selected
        .iter()
        .map(|inst| panel.trailing_volatility(inst, scores.date, vol_window))
        .collect();

    let known: Vec<f64> = vols.iter().filter_map(|v| *v).collect();
    if known.is_empty() {
        return vec![1.0; selected.len()];
    }
    let fallback = known.iter().sum::<f64>() / known.len() as f64;

    vols.iter()
        .map(|v| 1.0 / (v.unwrap_or(fallback) + VOL_EPSILON))
        .collect()
}
