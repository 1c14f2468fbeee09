//! Portfolio weight vectors.
//!
//! One type serves both roles in the pipeline: the target vector produced by
//! the constructor and the held vector owned by the simulation loop. Backed
//! by a `BTreeMap` so iteration order — and therefore every downstream
//! computation — is deterministic.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Tolerance used when checking the "weights sum to at most one" invariant.
pub const WEIGHT_EPSILON: f64 = 1e-9;

/// Mapping instrument id → portfolio weight in [0, 1].
///
/// Entries are long-only weights; the shortfall from 1.0 is implicit cash.
/// An empty vector is the all-cash "stand aside" portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightVector(BTreeMap<String, f64>);

impl WeightVector {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        )
    }

    pub fn get(&self, instrument: &str) -> f64 {
        self.0.get(instrument).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, instrument: impl Into<String>, weight: f64) {
        let key = instrument.into();
        if weight == 0.0 {
            self.0.remove(&key);
        } else {
            self.0.insert(key, weight);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all weights (gross long exposure).
    pub fn gross_exposure(&self) -> f64 {
        self.0.values().sum()
    }

    /// Union of instrument ids across two vectors, in deterministic order.
    pub fn union_keys<'a>(&'a self, other: &'a WeightVector) -> Vec<&'a str> {
        let set: BTreeSet<&str> = self
            .0
            .keys()
            .chain(other.0.keys())
            .map(|s| s.as_str())
            .collect();
        set.into_iter().collect()
    }

    /// Half the L1 distance between two portfolios over the union of names.
    pub fn turnover(&self, other: &WeightVector) -> f64 {
        self.union_keys(other)
            .iter()
            .map(|k| (self.get(k) - other.get(k)).abs())
            .sum::<f64>()
            / 2.0
    }

    /// Scale every weight so the vector sums to at most 1.0.
    ///
    /// Vectors already within the budget are left untouched — this never
    /// scales a portfolio *up* (cash remainders are legitimate).
    pub fn cap_gross_exposure(&mut self) {
        let total = self.gross_exposure();
        if total > 1.0 + WEIGHT_EPSILON {
            for w in self.0.values_mut() {
                *w /= total;
            }
        }
    }

    /// Invariant check: every entry non-negative, sum ≤ 1 + ε.
    pub fn is_valid(&self) -> bool {
        self.0.values().all(|&w| w >= 0.0)
            && self.gross_exposure() <= 1.0 + WEIGHT_EPSILON
    }
}
