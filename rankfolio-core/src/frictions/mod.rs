//! Execution realism — transaction cost, liquidity-capped slippage, and
//! drawdown-based exposure scaling.
//!
//! The three overlays compose independently and are pure functions of their
//! inputs; the only state they read is the running equity/drawdown the
//! simulation loop threads through.

pub mod cost;
pub mod drawdown;
pub mod liquidity;

pub use cost::TransactionCostModel;
pub use drawdown::{DrawdownLadder, LadderError, LadderStep};
pub use liquidity::{ExecutedTrade, LiquidityModel};
