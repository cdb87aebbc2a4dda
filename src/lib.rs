//! Baedang - Korean dividend and US-equity bookkeeping
//!
//! This library derives portfolio positions, realized gains by year, and
//! tax-aware sell plans from a flat transaction history, using the
//! weighted-average-cost method. The engine is a pure function of the
//! records supplied at call time; persistence, price retrieval, and
//! rendering are peripheral collaborators.

pub mod cli;
pub mod config;
pub mod dividends;
pub mod error;
pub mod health;
pub mod importers;
pub mod models;
pub mod pricing;
pub mod reports;
pub mod tax;
pub mod utils;
