use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Market/currency regime of an instrument
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Country {
    /// US market, priced in USD
    Usa,
    /// Domestic market, priced in KRW
    Kor,
}

impl Country {
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::Usa => "USA",
            Country::Kor => "KOR",
        }
    }

    /// Whether instruments in this market are priced in a foreign currency
    /// and therefore need an exchange rate to reach KRW.
    pub fn is_foreign(&self) -> bool {
        matches!(self, Country::Usa)
    }
}

impl FromStr for Country {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USA" | "US" | "미국" => Ok(Country::Usa),
            "KOR" | "KR" | "한국" => Ok(Country::Kor),
            _ => Err(()),
        }
    }
}

/// Transaction type (buy or sell)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Buy => "BUY",
            TradeType::Sell => "SELL",
        }
    }
}

impl FromStr for TradeType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" | "매수" | "B" => Ok(TradeType::Buy),
            "SELL" | "매도" | "S" => Ok(TradeType::Sell),
            _ => Err(()),
        }
    }
}

/// Dividend account tax regime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountKind {
    /// Taxable account: distributions are subject to withholding
    General,
    /// Tax-free account: no withholding on distributions
    TaxFree,
}

impl FromStr for AccountKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GENERAL" | "일반계좌" | "일반" => Ok(AccountKind::General),
            "TAX-FREE" | "TAX_FREE" | "비과세" | "비과세저축계좌" => Ok(AccountKind::TaxFree),
            _ => Err(()),
        }
    }
}

/// A buy or sell entry in the transaction history.
///
/// Amounts are in the instrument's native currency: USD for `Country::Usa`,
/// KRW for `Country::Kor`. `exchange_rate` is the FX rate captured at entry
/// time and is meaningful only for foreign-currency instruments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub symbol: String,
    pub country: Country,
    pub date: NaiveDate,
    pub trade_type: TradeType,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// price x quantity at entry time, native currency
    pub gross_amount: Decimal,
    /// Authoritative sell proceeds when supplied (may diverge from
    /// price x quantity due to fees); native currency
    pub sell_amount: Option<Decimal>,
    /// Native currency -> KRW at transaction time
    pub exchange_rate: Option<Decimal>,
    /// Broker account label, used only for per-account allocation display
    pub account: Option<String>,
}

impl TransactionRecord {
    /// FX rate with the missing case collapsed to zero.
    /// A zero rate on a foreign instrument is a data-quality defect that
    /// the health check reports; the engine itself just carries the zero.
    pub fn fx_or_zero(&self) -> Decimal {
        self.exchange_rate.unwrap_or(Decimal::ZERO)
    }

    /// Sell proceeds in native currency: explicit amount when present,
    /// otherwise price x quantity.
    pub fn sell_proceeds_native(&self) -> Decimal {
        self.sell_amount.unwrap_or(self.unit_price * self.quantity)
    }
}

/// A dividend receipt row. The `taxable_distribution`, `tax_amount`,
/// `price_change`, and `dividend_change` fields are derived by
/// [`crate::dividends::recalculate`] and are zero until computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendRecord {
    pub date: NaiveDate,
    pub stock_name: String,
    pub quantity: Decimal,
    pub current_price: Decimal,
    pub dividend_per_share: Decimal,
    pub tax_base: Decimal,
    #[serde(default)]
    pub taxable_distribution: Decimal,
    #[serde(default)]
    pub tax_amount: Decimal,
    #[serde(default)]
    pub price_change: Decimal,
    #[serde(default)]
    pub dividend_change: Decimal,
}

/// Running position for one symbol, all amounts in KRW
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
    pub total_cost_krw: Decimal,
    pub average_cost_krw: Decimal,
}

impl Position {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            quantity: Decimal::ZERO,
            total_cost_krw: Decimal::ZERO,
            average_cost_krw: Decimal::ZERO,
        }
    }
}

/// One realized gain, emitted per sell transaction
#[derive(Debug, Clone, Serialize)]
pub struct RealizedGainEvent {
    pub year: i32,
    pub symbol: String,
    pub date: NaiveDate,
    pub sold_quantity: Decimal,
    pub unit_price_native: Decimal,
    pub exchange_rate: Decimal,
    pub proceeds_krw: Decimal,
    pub cost_basis_krw: Decimal,
    pub realized_gain_krw: Decimal,
}

/// Realized gains grouped by calendar year
#[derive(Debug, Clone, Serialize)]
pub struct RealizedGainYearSummary {
    pub year: i32,
    pub total_realized_gain: Decimal,
    pub total_proceeds: Decimal,
    pub events: Vec<RealizedGainEvent>,
}
