//! Data-quality health check over the transaction history
//!
//! The engine deliberately absorbs bad data (zero-cost buys on missing FX,
//! skipped oversells) instead of failing; this pass is the strict surface
//! that flags those records for user correction. It is a pure report and
//! never changes what the engine computes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::config::ExclusionList;
use crate::models::{Country, TradeType, TransactionRecord};
use crate::tax::inventory::replay_order;

/// One flagged record
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum HealthIssue {
    /// Foreign-currency transaction without a usable FX rate: its KRW cost
    /// contribution is zero and gains will be overstated
    MissingExchangeRate {
        symbol: String,
        date: NaiveDate,
        trade_type: TradeType,
    },
    /// Sell larger than the quantity held at that point in the replay: the
    /// engine ignores the excess, so history upstream is incomplete
    Oversell {
        symbol: String,
        date: NaiveDate,
        sold: Decimal,
        held: Decimal,
    },
}

impl fmt::Display for HealthIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthIssue::MissingExchangeRate {
                symbol,
                date,
                trade_type,
            } => write!(
                f,
                "{} {} on {}: missing/zero exchange rate",
                trade_type.as_str(),
                symbol,
                date
            ),
            HealthIssue::Oversell {
                symbol,
                date,
                sold,
                held,
            } => write!(
                f,
                "SELL {} on {}: selling {} but only {} held",
                symbol, date, sold, held
            ),
        }
    }
}

/// Scan one currency domain for data-integrity anomalies, in replay order
pub fn scan(
    records: &[TransactionRecord],
    country: Country,
    exclusions: &ExclusionList,
) -> Vec<HealthIssue> {
    let mut issues = Vec::new();
    let mut held: HashMap<String, Decimal> = HashMap::new();

    for tx in replay_order(records, country, exclusions) {
        if tx.country.is_foreign() && tx.fx_or_zero() <= Decimal::ZERO {
            issues.push(HealthIssue::MissingExchangeRate {
                symbol: tx.symbol.clone(),
                date: tx.date,
                trade_type: tx.trade_type,
            });
        }

        let qty = held.entry(tx.symbol.clone()).or_insert(Decimal::ZERO);
        match tx.trade_type {
            TradeType::Buy => *qty += tx.quantity,
            TradeType::Sell => {
                if tx.quantity > *qty {
                    issues.push(HealthIssue::Oversell {
                        symbol: tx.symbol.clone(),
                        date: tx.date,
                        sold: tx.quantity,
                        held: *qty,
                    });
                }
                *qty = (*qty - tx.quantity).max(Decimal::ZERO);
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(
        symbol: &str,
        d: NaiveDate,
        trade_type: TradeType,
        qty: i64,
        fx: Option<i64>,
    ) -> TransactionRecord {
        TransactionRecord {
            symbol: symbol.to_string(),
            country: Country::Usa,
            date: d,
            trade_type,
            quantity: Decimal::from(qty),
            unit_price: dec!(10),
            gross_amount: Decimal::from(qty * 10),
            sell_amount: None,
            exchange_rate: fx.map(Decimal::from),
            account: None,
        }
    }

    #[test]
    fn test_clean_history_has_no_issues() {
        let records = vec![
            tx("SCHD", date(2025, 1, 2), TradeType::Buy, 100, Some(1300)),
            tx("SCHD", date(2025, 2, 2), TradeType::Sell, 50, Some(1320)),
        ];
        assert!(scan(&records, Country::Usa, &ExclusionList::default()).is_empty());
    }

    #[test]
    fn test_missing_fx_is_flagged() {
        let records = vec![tx("SCHD", date(2025, 1, 2), TradeType::Buy, 100, None)];
        let issues = scan(&records, Country::Usa, &ExclusionList::default());
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            issues[0],
            HealthIssue::MissingExchangeRate { .. }
        ));
    }

    #[test]
    fn test_oversell_is_flagged_with_quantities() {
        let records = vec![
            tx("SCHD", date(2025, 1, 2), TradeType::Buy, 10, Some(1300)),
            tx("SCHD", date(2025, 2, 2), TradeType::Sell, 25, Some(1300)),
        ];
        let issues = scan(&records, Country::Usa, &ExclusionList::default());
        assert_eq!(
            issues[0],
            HealthIssue::Oversell {
                symbol: "SCHD".to_string(),
                date: date(2025, 2, 2),
                sold: dec!(25),
                held: dec!(10),
            }
        );
    }

    #[test]
    fn test_excluded_symbols_are_not_scanned() {
        let records = vec![tx("외화-RP", date(2025, 1, 2), TradeType::Buy, 100, None)];
        assert!(scan(&records, Country::Usa, &ExclusionList::default()).is_empty());
    }
}
