//! Rebalance scheduling — downsample the trading calendar to rebalance dates.
//!
//! The schedule is derived purely from dates that exist in the panel; it
//! never invents synthetic dates, so the simulator can always look prices up
//! on a rebalance date.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// How often the portfolio may be recomposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RebalanceCadence {
    /// Every `n`-th trading day, anchored at the first panel date.
    EveryNthDay { n: usize },

    /// Last trading day of each ISO week (Friday-anchored in practice).
    Weekly,

    /// Last trading day of each calendar month.
    Monthly,
}

impl Default for RebalanceCadence {
    fn default() -> Self {
        RebalanceCadence::Weekly
    }
}

/// Build the ordered rebalance schedule from the panel's distinct dates.
///
/// `dates` must already be sorted ascending and deduplicated (the panel
/// guarantees this). Fewer than 2 usable dates yields an empty schedule:
/// there is nothing to simulate, and the caller reports zero periods.
pub fn build_schedule(dates: &[NaiveDate], cadence: RebalanceCadence) -> Vec<NaiveDate> {
    if dates.len() < 2 {
        return Vec::new();
    }

    match cadence {
        RebalanceCadence::EveryNthDay { n } => {
            let step = n.max(1);
            dates.iter().step_by(step).copied().collect()
        }
        RebalanceCadence::Weekly => last_of_group(dates, |d| {
            let week = d.iso_week();
            (week.year(), week.week())
        }),
        RebalanceCadence::Monthly => last_of_group(dates, |d| (d.year(), d.month())),
    }
}

/// Keep the last date of each consecutive group. Groups are contiguous in a
/// sorted calendar, so a single pass suffices.
fn last_of_group<K: PartialEq>(dates: &[NaiveDate], key: impl Fn(&NaiveDate) -> K) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    for window in dates.windows(2) {
        if key(&window[0]) != key(&window[1]) {
            out.push(window[0]);
        }
    }
    if let Some(&last) = dates.last() {
        out.push(last);
    }
    out
}
