//! Rankfolio Core — backtest simulation and risk-overlay engine.
//!
//! This crate contains the full simulation pipeline:
//! - Domain types (price panel, weight vectors, equity curve)
//! - Alpha scoring rules over the cross-section
//! - Rebalance scheduling and rank-based portfolio construction
//! - Turnover governance (threshold filter + turnover cap)
//! - Execution frictions (transaction costs, liquidity cap, drawdown ladder)
//! - Sequential equity simulation and performance analytics
//! - Stress-scenario replay of completed runs

pub mod analytics;
pub mod config;
pub mod construct;
pub mod domain;
pub mod engine;
pub mod frictions;
pub mod governor;
pub mod schedule;
pub mod score;
pub mod stress;

mod stats;
