//! Raw price observation — the single-row input record handed over by ingestion.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily price row for one instrument.
///
/// The engine never mutates observations; they are validated once during
/// panel construction and then only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub instrument: String,
    pub close: f64,
    /// Traded volume in shares. Optional: panels without volume are still
    /// simulated, but liquidity capping is disabled for those instruments.
    pub volume: Option<f64>,
}

impl PriceObservation {
    pub fn new(date: NaiveDate, instrument: impl Into<String>, close: f64) -> Self {
        Self {
            date,
            instrument: instrument.into(),
            close,
            volume: None,
        }
    }

    pub fn with_volume(
        date: NaiveDate,
        instrument: impl Into<String>,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            date,
            instrument: instrument.into(),
            close,
            volume: Some(volume),
        }
    }

    /// Notional traded value for this day, if volume is known.
    pub fn traded_value(&self) -> Option<f64> {
        self.volume.map(|v| v * self.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn traded_value_with_volume() {
        let obs = PriceObservation::with_volume(d(2024, 1, 2), "ACME", 50.0, 10_000.0);
        assert_eq!(obs.traded_value(), Some(500_000.0));
    }

    #[test]
    fn traded_value_without_volume() {
        let obs = PriceObservation::new(d(2024, 1, 2), "ACME", 50.0);
        assert_eq!(obs.traded_value(), None);
    }
}
