//! Policy constants and instrument exclusions
//!
//! Tax policy (annual exemption, rates) and the excluded-instrument list are
//! configuration, not literals buried in the algorithms. Defaults match the
//! Korean regime for overseas equities; a TOML file can override any field.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fixed tax policy applied to realized gains and distributions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxPolicy {
    /// Realized gain per calendar year not subject to tax (KRW)
    pub annual_exemption: Decimal,
    /// Flat rate on the taxable base of realized gains
    pub capital_gains_rate: Decimal,
    /// Withholding rate on taxable dividend distributions
    pub dividend_withholding_rate: Decimal,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            annual_exemption: Decimal::from(2_500_000),
            capital_gains_rate: Decimal::new(22, 2),        // 0.22
            dividend_withholding_rate: Decimal::new(154, 3), // 0.154
        }
    }
}

impl TaxPolicy {
    /// Exemption still available this year given gains already realized.
    /// Never negative; an over-consumed exemption just reads as zero.
    pub fn remaining_exemption(&self, already_realized_gain: Decimal) -> Decimal {
        (self.annual_exemption - already_realized_gain).max(Decimal::ZERO)
    }
}

/// Instrument names excluded from tax computation entirely
/// (cash-equivalent money-market vehicles such as foreign-currency RP)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionList {
    names: Vec<String>,
}

impl Default for ExclusionList {
    fn default() -> Self {
        Self {
            names: vec!["외화-RP".to_string()],
        }
    }
}

impl ExclusionList {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn is_excluded(&self, symbol: &str) -> bool {
        self.names.iter().any(|n| n == symbol)
    }
}

/// Top-level configuration, loadable from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub policy: TaxPolicy,
    pub exclusions: ExclusionList,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("failed to parse config TOML")
    }
}
