//! Price panel — the validated, immutable container the whole engine reads from.
//!
//! A panel is built once from raw observations and never mutated afterwards.
//! It owns a per-instrument date-sorted series plus the distinct trading
//! calendar, and exposes the pure lookups the scoring and simulation layers
//! need: lagged percent change, trailing realized volatility, single-period
//! returns, and trailing average daily traded value.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::observation::PriceObservation;
use crate::stats::sample_std;

/// Errors raised while assembling a panel from raw observations.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("observation for '{instrument}' on {date} has non-positive close {close}")]
    NonPositiveClose {
        instrument: String,
        date: NaiveDate,
        close: f64,
    },
    #[error("duplicate observation for '{instrument}' on {date}")]
    DuplicateObservation { instrument: String, date: NaiveDate },
    #[error("observation with empty instrument id on {date}")]
    EmptyInstrumentId { date: NaiveDate },
}

#[derive(Debug, Clone, Copy)]
struct SeriesPoint {
    date: NaiveDate,
    close: f64,
    volume: Option<f64>,
}

/// Date-sorted series for a single instrument, with a date → position index.
#[derive(Debug, Clone, Default)]
struct InstrumentSeries {
    points: Vec<SeriesPoint>,
    index: HashMap<NaiveDate, usize>,
}

impl InstrumentSeries {
    fn position(&self, date: NaiveDate) -> Option<usize> {
        self.index.get(&date).copied()
    }
}

/// Immutable cross-sectional price history.
///
/// `BTreeMap` keyed by instrument id gives deterministic iteration order,
/// which downstream selection relies on for reproducible tie-breaking.
#[derive(Debug, Clone, Default)]
pub struct PricePanel {
    dates: Vec<NaiveDate>,
    series: BTreeMap<String, InstrumentSeries>,
}

impl PricePanel {
    /// Build a panel from raw observations.
    ///
    /// Observations may arrive in any order; they are sorted per instrument.
    /// Rejected outright: non-positive closes, duplicate (date, instrument)
    /// pairs, empty instrument ids. An empty input produces an empty panel,
    /// which is a valid (if useless) state — downstream layers degrade to
    /// empty scores and a zero-period simulation.
    pub fn from_observations(
        observations: Vec<PriceObservation>,
    ) -> Result<Self, PanelError> {
        let mut series: BTreeMap<String, InstrumentSeries> = BTreeMap::new();

        for obs in observations {
            if obs.instrument.is_empty() {
                return Err(PanelError::EmptyInstrumentId { date: obs.date });
            }
            if !(obs.close > 0.0) {
                return Err(PanelError::NonPositiveClose {
                    instrument: obs.instrument,
                    date: obs.date,
                    close: obs.close,
                });
            }
            let entry = series.entry(obs.instrument.clone()).or_default();
            if entry.index.contains_key(&obs.date) {
                return Err(PanelError::DuplicateObservation {
                    instrument: obs.instrument,
                    date: obs.date,
                });
            }
            // Index positions are rebuilt after the sort below.
            entry.index.insert(obs.date, usize::MAX);
            entry.points.push(SeriesPoint {
                date: obs.date,
                close: obs.close,
                volume: obs.volume,
            });
        }

        let mut all_dates: Vec<NaiveDate> = Vec::new();
        for s in series.values_mut() {
            s.points.sort_by_key(|p| p.date);
            s.index.clear();
            for (i, p) in s.points.iter().enumerate() {
                s.index.insert(p.date, i);
                all_dates.push(p.date);
            }
        }
        all_dates.sort();
        all_dates.dedup();

        Ok(Self {
            dates: all_dates,
            series,
        })
    }

    /// The distinct trading calendar, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Instrument ids in deterministic (lexicographic) order.
    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|s| s.as_str())
    }

    pub fn instrument_count(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Close price for an instrument on an exact date, if observed.
    pub fn close(&self, instrument: &str, date: NaiveDate) -> Option<f64> {
        let s = self.series.get(instrument)?;
        s.position(date).map(|i| s.points[i].close)
    }

    /// Number of observations for an instrument up to and including `date`.
    pub fn history_len(&self, instrument: &str, date: NaiveDate) -> usize {
        match self.series.get(instrument) {
            Some(s) => match s.position(date) {
                Some(i) => i + 1,
                None => s.points.partition_point(|p| p.date <= date),
            },
            None => 0,
        }
    }

    /// Lagged percent change: close[t - skip] / close[t - skip - periods] - 1,
    /// measured in the instrument's own observation sequence ending at `date`.
    ///
    /// `None` when the instrument was not observed on `date` or lacks the
    /// required history — the caller excludes it, this is not an error.
    pub fn pct_change(
        &self,
        instrument: &str,
        date: NaiveDate,
        periods: usize,
        skip: usize,
    ) -> Option<f64> {
        let s = self.series.get(instrument)?;
        let i = s.position(date)?;
        if i < skip + periods {
            return None;
        }
        let end = s.points[i - skip].close;
        let start = s.points[i - skip - periods].close;
        Some(end / start - 1.0)
    }

    /// Single-period simple return ending at `date` (previous observation of
    /// the same instrument, not the previous calendar date).
    pub fn simple_return(&self, instrument: &str, date: NaiveDate) -> Option<f64> {
        self.pct_change(instrument, date, 1, 0)
    }

    /// Trailing realized volatility: sample std of the last `window` simple
    /// returns ending at `date`. Requires `window + 1` observations.
    pub fn trailing_volatility(
        &self,
        instrument: &str,
        date: NaiveDate,
        window: usize,
    ) -> Option<f64> {
        if window < 2 {
            return None;
        }
        let s = self.series.get(instrument)?;
        let i = s.position(date)?;
        if i < window {
            return None;
        }
        let returns: Vec<f64> = (i - window + 1..=i)
            .map(|k| s.points[k].close / s.points[k - 1].close - 1.0)
            .collect();
        Some(sample_std(&returns))
    }

    /// Trailing average daily traded value (close × volume) over the last
    /// `window` observations ending at `date`.
    ///
    /// Days without volume are skipped; `None` when no volume data exists in
    /// the window at all, which callers treat as "liquidity unconstrained".
    pub fn average_daily_value(
        &self,
        instrument: &str,
        date: NaiveDate,
        window: usize,
    ) -> Option<f64> {
        let s = self.series.get(instrument)?;
        let i = s.position(date)?;
        let start = i.saturating_sub(window.saturating_sub(1));
        let values: Vec<f64> = s.points[start..=i]
            .iter()
            .filter_map(|p| p.volume.map(|v| v * p.close))
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn panel(rows: &[(u32, &str, f64)]) -> PricePanel {
        let obs = rows
            .iter()
            .map(|&(day, sym, close)| PriceObservation::new(d(day), sym, close))
            .collect();
        PricePanel::from_observations(obs).unwrap()
    }

    #[test]
    fn calendar_is_sorted_and_distinct() {
        let p = panel(&[(3, "B", 10.0), (2, "A", 5.0), (3, "A", 6.0), (2, "B", 9.0)]);
        assert_eq!(p.dates(), &[d(2), d(3)]);
        let names: Vec<&str> = p.instruments().collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn rejects_non_positive_close() {
        let obs = vec![PriceObservation::new(d(2), "A", 0.0)];
        let err = PricePanel::from_observations(obs).unwrap_err();
        assert!(matches!(err, PanelError::NonPositiveClose { .. }));
    }

    #[test]
    fn rejects_duplicate_observation() {
        let obs = vec![
            PriceObservation::new(d(2), "A", 5.0),
            PriceObservation::new(d(2), "A", 6.0),
        ];
        let err = PricePanel::from_observations(obs).unwrap_err();
        assert!(matches!(err, PanelError::DuplicateObservation { .. }));
    }

    #[test]
    fn empty_input_is_valid() {
        let p = PricePanel::from_observations(Vec::new()).unwrap();
        assert!(p.is_empty());
        assert!(p.dates().is_empty());
    }

    #[test]
    fn pct_change_basic() {
        let p = panel(&[(1, "A", 100.0), (2, "A", 110.0), (3, "A", 121.0)]);
        let r = p.pct_change("A", d(3), 2, 0).unwrap();
        assert!((r - 0.21).abs() < 1e-12);
    }

    #[test]
    fn pct_change_with_skip() {
        let p = panel(&[(1, "A", 100.0), (2, "A", 110.0), (3, "A", 121.0)]);
        // skip the latest observation: 110 / 100 - 1
        let r = p.pct_change("A", d(3), 1, 1).unwrap();
        assert!((r - 0.10).abs() < 1e-12);
    }

    #[test]
    fn pct_change_insufficient_history() {
        let p = panel(&[(1, "A", 100.0), (2, "A", 110.0)]);
        assert!(p.pct_change("A", d(2), 5, 0).is_none());
        assert!(p.pct_change("A", d(3), 1, 0).is_none()); // not observed on d(3)
        assert!(p.pct_change("Z", d(2), 1, 0).is_none()); // unknown instrument
    }

    #[test]
    fn simple_return_uses_instrument_sequence() {
        // A skips day 2; its return on day 3 spans day 1 → day 3.
        let p = panel(&[(1, "A", 100.0), (3, "A", 105.0), (2, "B", 50.0)]);
        let r = p.simple_return("A", d(3)).unwrap();
        assert!((r - 0.05).abs() < 1e-12);
    }

    #[test]
    fn trailing_volatility_constant_prices_is_zero() {
        let p = panel(&[(1, "A", 100.0), (2, "A", 100.0), (3, "A", 100.0), (4, "A", 100.0)]);
        let v = p.trailing_volatility("A", d(4), 3).unwrap();
        assert_eq!(v, 0.0);
    }

    #[test]
    fn trailing_volatility_needs_window_plus_one() {
        let p = panel(&[(1, "A", 100.0), (2, "A", 101.0), (3, "A", 102.0)]);
        assert!(p.trailing_volatility("A", d(3), 3).is_none());
        assert!(p.trailing_volatility("A", d(3), 2).is_some());
    }

    #[test]
    fn average_daily_value_skips_missing_volume() {
        let obs = vec![
            PriceObservation::with_volume(d(1), "A", 10.0, 1_000.0),
            PriceObservation::new(d(2), "A", 10.0),
            PriceObservation::with_volume(d(3), "A", 20.0, 1_000.0),
        ];
        let p = PricePanel::from_observations(obs).unwrap();
        // (10_000 + 20_000) / 2, the volume-less day is skipped
        let adv = p.average_daily_value("A", d(3), 3).unwrap();
        assert!((adv - 15_000.0).abs() < 1e-9);
    }

    #[test]
    fn average_daily_value_none_without_any_volume() {
        let p = panel(&[(1, "A", 10.0), (2, "A", 11.0)]);
        assert!(p.average_daily_value("A", d(2), 2).is_none());
    }

    #[test]
    fn history_len_counts_up_to_date() {
        let p = panel(&[(1, "A", 1.0), (3, "A", 2.0), (5, "A", 3.0)]);
        assert_eq!(p.history_len("A", d(3)), 2);
        assert_eq!(p.history_len("A", d(4)), 2);
        assert_eq!(p.history_len("A", d(5)), 3);
        assert_eq!(p.history_len("Z", d(5)), 0);
    }
}
