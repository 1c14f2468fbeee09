//! Alpha scoring — turns the price panel into per-date cross-sections of
//! scalar ranking scores.
//!
//! Scoring is a pure precomputation over historical data: it never sees
//! simulation state, so the per-date cross-sections can be computed in
//! parallel without affecting determinism.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::PricePanel;

/// Fixed blend constants for the deterministic factor blend.
///
/// The blend is a heuristic formula, not a fitted model; the constants are
/// part of the rule definition and deliberately not configurable.
pub const BLEND_MOMENTUM: f64 = 0.5;
pub const BLEND_REVERSAL: f64 = 0.3;
pub const BLEND_VOLATILITY: f64 = 0.2;

/// Small denominator guard for volatility normalization.
pub const VOL_EPSILON: f64 = 1e-8;

/// Closed set of scoring rules, dispatched through `scores_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoringRule {
    /// Trailing percent change over `lookback` observations, optionally
    /// skipping the most recent `skip_recent` observations to sidestep
    /// short-term reversal contamination.
    Momentum { lookback: usize, skip_recent: usize },

    /// Negative short-window percent change; dividing by trailing volatility
    /// (when `vol_window` is set) normalizes magnitude across instruments.
    MeanReversion {
        lookback: usize,
        vol_window: Option<usize>,
    },

    /// 0.5·momentum − 0.3·reversal − 0.2·volatility, all from trailing
    /// windows. Deterministic stand-in for a learned factor score.
    BlendedFactor {
        momentum_window: usize,
        reversal_window: usize,
        vol_window: usize,
    },
}

impl Default for ScoringRule {
    fn default() -> Self {
        ScoringRule::Momentum {
            lookback: 20,
            skip_recent: 0,
        }
    }
}

impl ScoringRule {
    /// Observations an instrument needs before it can produce a score.
    pub fn min_history(&self) -> usize {
        match *self {
            ScoringRule::Momentum {
                lookback,
                skip_recent,
            } => lookback + skip_recent + 1,
            ScoringRule::MeanReversion {
                lookback,
                vol_window,
            } => lookback.max(vol_window.unwrap_or(0)) + 1,
            ScoringRule::BlendedFactor {
                momentum_window,
                reversal_window,
                vol_window,
            } => momentum_window.max(reversal_window).max(vol_window) + 1,
        }
    }

    fn score_one(&self, panel: &PricePanel, instrument: &str, date: NaiveDate) -> Option<f64> {
        match *self {
            ScoringRule::Momentum {
                lookback,
                skip_recent,
            } => panel.pct_change(instrument, date, lookback, skip_recent),
            ScoringRule::MeanReversion {
                lookback,
                vol_window,
            } => {
                let change = panel.pct_change(instrument, date, lookback, 0)?;
                match vol_window {
                    Some(w) => {
                        let vol = panel.trailing_volatility(instrument, date, w)?;
                        Some(-change / (vol + VOL_EPSILON))
                    }
                    None => Some(-change),
                }
            }
            ScoringRule::BlendedFactor {
                momentum_window,
                reversal_window,
                vol_window,
            } => {
                let momentum = panel.pct_change(instrument, date, momentum_window, 0)?;
                let reversal = panel.pct_change(instrument, date, reversal_window, 0)?;
                let vol = panel.trailing_volatility(instrument, date, vol_window)?;
                Some(BLEND_MOMENTUM * momentum - BLEND_REVERSAL * reversal - BLEND_VOLATILITY * vol)
            }
        }
    }
}

/// One instrument's score on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub date: NaiveDate,
    pub instrument: String,
    pub score: f64,
}

/// Cross-section of scores for a single date, ranked best-first.
#[derive(Debug, Clone, Default)]
pub struct ScoreSet {
    pub date: NaiveDate,
    /// Sorted descending by score, ties broken by instrument id ascending.
    pub records: Vec<ScoreRecord>,
}

/// Score every instrument with sufficient history on `date`.
///
/// Instruments lacking history, unobserved on the date, or producing a
/// non-finite score are silently excluded. An empty panel yields an empty
/// cross-section — downstream treats that as a full-cash period.
pub fn scores_at(panel: &PricePanel, rule: &ScoringRule, date: NaiveDate) -> ScoreSet {
    let mut records: Vec<ScoreRecord> = panel
        .instruments()
        .filter_map(|instrument| {
            let score = rule.score_one(panel, instrument, date)?;
            if !score.is_finite() {
                return None;
            }
            Some(ScoreRecord {
                date,
                instrument: instrument.to_string(),
                score,
            })
        })
        .collect();

    // Stable ranking: descending score, then instrument id, so selection is
    // reproducible even under exact score ties.
    records.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.instrument.cmp(&b.instrument))
    });

    ScoreSet { date, records }
}

/// Precompute score cross-sections for a set of rebalance dates in parallel.
///
/// Output order matches the input date order regardless of thread scheduling.
pub fn score_table(panel: &PricePanel, rule: &ScoringRule, dates: &[NaiveDate]) -> Vec<ScoreSet> {
    dates
        .par_iter()
        .map(|&date| scores_at(panel, rule, date))
        .collect()
}
