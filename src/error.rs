//! Error handling for the bookkeeping engine and CLI
//!
//! Defines custom error types and establishes a unified Result type
//! using anyhow for context chaining and error propagation.

use rust_decimal::Decimal;
use thiserror::Error;

/// Core error types for ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("pricing error: {0}")]
    Pricing(String),
}

/// Precondition violations for the strategy planners. These are caller
/// errors surfaced before any planning work runs, never mid-computation.
#[derive(Error, Debug, PartialEq)]
pub enum PlanError {
    #[error("target amount must be positive, got {0}")]
    NonPositiveTarget(Decimal),

    #[error("exchange rate must be positive, got {0}")]
    NonPositiveFxRate(Decimal),

    #[error("no usable live price for: {}", .0.join(", "))]
    MissingPrices(Vec<String>),
}

/// Result type alias for ledger operations
pub type Result<T> = anyhow::Result<T>;
