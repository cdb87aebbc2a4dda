//! CSV transaction and dividend sources
//!
//! The engine only ever sees fully parsed records; these importers are the
//! thin collaborator that produces them from headered CSV files. Malformed
//! rows are counted and skipped, never fatal: a partially readable file
//! still yields every valid record plus a report of what was dropped.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

use crate::error::LedgerError;
use crate::models::{Country, DividendRecord, TradeType, TransactionRecord};

/// Rows that failed to parse, by line description
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: Vec<String>,
}

/// CSV row as written by the entry layer. Numeric/enum fields arrive as
/// strings (Korean trade types, empty optionals) and are converted here.
#[derive(Debug, Deserialize)]
struct RawTransactionRow {
    date: String,
    symbol: String,
    country: String,
    trade_type: String,
    quantity: String,
    unit_price: String,
    #[serde(default)]
    gross_amount: String,
    #[serde(default)]
    sell_amount: String,
    #[serde(default)]
    exchange_rate: String,
    #[serde(default)]
    account: String,
}

fn parse_decimal(raw: &str, field: &str) -> Result<Decimal> {
    raw.trim()
        .replace(',', "")
        .parse::<Decimal>()
        .with_context(|| format!("invalid {}: {:?}", field, raw))
}

fn parse_optional_decimal(raw: &str, field: &str) -> Result<Option<Decimal>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_decimal(trimmed, field).map(Some)
}

impl RawTransactionRow {
    fn into_record(self) -> Result<TransactionRecord> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid date: {:?}", self.date))?;
        let country: Country = self
            .country
            .parse()
            .map_err(|_| LedgerError::Parse(format!("invalid country: {:?}", self.country)))?;
        let trade_type: TradeType = self.trade_type.parse().map_err(|_| {
            LedgerError::Parse(format!("invalid trade type: {:?}", self.trade_type))
        })?;

        let quantity = parse_decimal(&self.quantity, "quantity")?;
        let unit_price = parse_decimal(&self.unit_price, "unit price")?;
        let gross_amount = match parse_optional_decimal(&self.gross_amount, "gross amount")? {
            Some(amount) => amount,
            None => unit_price * quantity,
        };

        Ok(TransactionRecord {
            symbol: self.symbol.trim().to_string(),
            country,
            date,
            trade_type,
            quantity,
            unit_price,
            gross_amount,
            sell_amount: parse_optional_decimal(&self.sell_amount, "sell amount")?,
            exchange_rate: parse_optional_decimal(&self.exchange_rate, "exchange rate")?,
            account: match self.account.trim() {
                "" => None,
                label => Some(label.to_string()),
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawDividendRow {
    date: String,
    stock_name: String,
    quantity: String,
    current_price: String,
    dividend_per_share: String,
    #[serde(default)]
    tax_base: String,
}

impl RawDividendRow {
    fn into_record(self) -> Result<DividendRecord> {
        Ok(DividendRecord {
            date: NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
                .with_context(|| format!("invalid date: {:?}", self.date))?,
            stock_name: self.stock_name.trim().to_string(),
            quantity: parse_decimal(&self.quantity, "quantity")?,
            current_price: parse_decimal(&self.current_price, "current price")?,
            dividend_per_share: parse_decimal(&self.dividend_per_share, "dividend per share")?,
            tax_base: parse_optional_decimal(&self.tax_base, "tax base")?.unwrap_or(Decimal::ZERO),
            taxable_distribution: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            price_change: Decimal::ZERO,
            dividend_change: Decimal::ZERO,
        })
    }
}

/// Load transaction records from a headered CSV file
pub fn import_transactions(path: &Path) -> Result<(Vec<TransactionRecord>, ImportReport)> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut records = Vec::new();
    let mut report = ImportReport::default();

    for (idx, row) in reader.deserialize::<RawTransactionRow>().enumerate() {
        let line = idx + 2; // header is line 1
        let parsed = row
            .map_err(anyhow::Error::from)
            .and_then(RawTransactionRow::into_record);
        match parsed {
            Ok(record) => {
                records.push(record);
                report.imported += 1;
            }
            Err(e) => {
                warn!("skipping transaction row at line {}: {}", line, e);
                report.skipped.push(format!("line {}: {}", line, e));
            }
        }
    }

    Ok((records, report))
}

/// Load dividend receipt records from a headered CSV file
pub fn import_dividends(path: &Path) -> Result<(Vec<DividendRecord>, ImportReport)> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut records = Vec::new();
    let mut report = ImportReport::default();

    for (idx, row) in reader.deserialize::<RawDividendRow>().enumerate() {
        let line = idx + 2;
        let parsed = row
            .map_err(anyhow::Error::from)
            .and_then(RawDividendRow::into_record);
        match parsed {
            Ok(record) => {
                records.push(record);
                report.imported += 1;
            }
            Err(e) => {
                warn!("skipping dividend row at line {}: {}", line, e);
                report.skipped.push(format!("line {}: {}", line, e));
            }
        }
    }

    Ok((records, report))
}
