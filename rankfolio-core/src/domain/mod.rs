//! Domain types: observations, the price panel, weight vectors, equity points.

pub mod equity;
pub mod observation;
pub mod panel;
pub mod weights;

pub use equity::{drawdown_series, equity_values, EquityPoint};
pub use observation::PriceObservation;
pub use panel::{PanelError, PricePanel};
pub use weights::{WeightVector, WEIGHT_EPSILON};
