//! Per-row derived fields for dividend receipt records
//!
//! A single chronological pass, no lot tracking: each row gets its taxable
//! distribution and withholding tax, plus price/per-share-dividend deltas
//! against the previous record of the same instrument.

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::config::TaxPolicy;
use crate::models::{AccountKind, DividendRecord};

/// Aggregate figures across a set of dividend rows
#[derive(Debug, Clone, Serialize)]
pub struct SummaryStats {
    pub total_taxable_distribution: Decimal,
    pub total_tax_amount: Decimal,
    /// Gross distributions minus withholding
    pub total_received: Decimal,
}

/// Received total for one calendar month
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyStats {
    /// YYYY-MM
    pub month: String,
    pub total_amount: Decimal,
}

/// Recompute every derived field over the full timeline.
///
/// Rows are sorted ascending by date first so deltas always compare against
/// the chronologically previous record of the same instrument. Under a
/// tax-free account regime both taxable distribution and tax amount are
/// zero; withholding tax is floored to whole KRW.
pub fn recalculate(
    records: &[DividendRecord],
    account: AccountKind,
    policy: &TaxPolicy,
) -> Vec<DividendRecord> {
    let mut sorted: Vec<DividendRecord> = records.to_vec();
    sorted.sort_by_key(|r| r.date);

    // Last seen price / per-share dividend per instrument
    let mut history: HashMap<String, (Decimal, Decimal)> = HashMap::new();

    sorted
        .into_iter()
        .map(|mut record| {
            let tax_free = account == AccountKind::TaxFree;

            record.taxable_distribution = if tax_free {
                Decimal::ZERO
            } else {
                record.tax_base * record.quantity
            };
            record.tax_amount = if tax_free {
                Decimal::ZERO
            } else {
                (record.taxable_distribution * policy.dividend_withholding_rate).floor()
            };

            match history.get(&record.stock_name) {
                Some((prev_price, prev_dividend)) => {
                    record.price_change = record.current_price - prev_price;
                    record.dividend_change = record.dividend_per_share - prev_dividend;
                }
                None => {
                    record.price_change = Decimal::ZERO;
                    record.dividend_change = Decimal::ZERO;
                }
            }
            history.insert(
                record.stock_name.clone(),
                (record.current_price, record.dividend_per_share),
            );

            record
        })
        .collect()
}

/// Totals over recalculated rows. Gross distribution per row is
/// quantity x dividend per share; received is gross minus withholding.
pub fn summary(records: &[DividendRecord]) -> SummaryStats {
    let mut stats = SummaryStats {
        total_taxable_distribution: Decimal::ZERO,
        total_tax_amount: Decimal::ZERO,
        total_received: Decimal::ZERO,
    };

    for record in records {
        let gross = record.quantity * record.dividend_per_share;
        stats.total_taxable_distribution += record.taxable_distribution;
        stats.total_tax_amount += record.tax_amount;
        stats.total_received += gross - record.tax_amount;
    }

    stats
}

/// Net received amount per calendar month, ascending
pub fn monthly_totals(records: &[DividendRecord]) -> Vec<MonthlyStats> {
    let mut by_month: BTreeMap<String, Decimal> = BTreeMap::new();

    for record in records {
        let month = format!("{:04}-{:02}", record.date.year(), record.date.month());
        let gross = record.quantity * record.dividend_per_share;
        *by_month.entry(month).or_insert(Decimal::ZERO) += gross - record.tax_amount;
    }

    by_month
        .into_iter()
        .map(|(month, total_amount)| MonthlyStats {
            month,
            total_amount,
        })
        .collect()
}
