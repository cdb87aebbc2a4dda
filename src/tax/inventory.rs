//! Weighted-average-cost inventory tracker
//!
//! Replays the full transaction history on every call and derives current
//! positions from scratch. There is no persisted derived state: the tracker
//! is a pure reducer over the records it is handed, so two calls with the
//! same input always agree and concurrent callers share nothing.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::warn;

use crate::config::ExclusionList;
use crate::models::{Country, Position, TradeType, TransactionRecord};

/// Quantities below this after a sell are treated as a fully exited
/// position and reset to zero together with the cost basis.
pub(crate) const QTY_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 9); // 1e-9

/// Transactions relevant to one currency domain, in replay order.
///
/// Filters to the requested market, drops excluded instruments, and sorts
/// ascending by date. The sort is stable: same-date transactions keep their
/// input order, since intra-day ordering is not resolvable from date alone.
pub fn replay_order<'a>(
    records: &'a [TransactionRecord],
    country: Country,
    exclusions: &ExclusionList,
) -> Vec<&'a TransactionRecord> {
    let mut selected: Vec<&TransactionRecord> = records
        .iter()
        .filter(|r| r.country == country && !exclusions.is_excluded(&r.symbol))
        .collect();
    selected.sort_by_key(|r| r.date);
    selected
}

/// Gross amount of a buy converted to KRW through the entry-time FX rate.
/// Domestic instruments are already in KRW (rate 1).
fn buy_cost_krw(tx: &TransactionRecord) -> Decimal {
    if tx.country.is_foreign() {
        tx.gross_amount * tx.fx_or_zero()
    } else {
        tx.gross_amount
    }
}

/// Compute current positions for one currency domain using the
/// weighted-average-cost method.
///
/// Sells against an empty position are skipped as data-integrity anomalies
/// (logged, never fatal); sells are otherwise costed at the average cost of
/// the position at that moment. Fully exited symbols are omitted from the
/// result.
pub fn compute_positions(
    records: &[TransactionRecord],
    country: Country,
    exclusions: &ExclusionList,
) -> BTreeMap<String, Position> {
    let mut inventory: BTreeMap<String, Position> = BTreeMap::new();

    for tx in replay_order(records, country, exclusions) {
        let pos = inventory
            .entry(tx.symbol.clone())
            .or_insert_with(|| Position::new(&tx.symbol));

        match tx.trade_type {
            TradeType::Buy => {
                pos.quantity += tx.quantity;
                pos.total_cost_krw += buy_cost_krw(tx);
            }
            TradeType::Sell => {
                if pos.quantity <= Decimal::ZERO {
                    warn!(
                        symbol = %tx.symbol,
                        date = %tx.date,
                        "sell without held quantity, skipping (data-integrity anomaly)"
                    );
                    continue;
                }

                let avg_cost = pos.total_cost_krw / pos.quantity;
                let cost_of_sale = avg_cost * tx.quantity;

                pos.quantity -= tx.quantity;
                pos.total_cost_krw -= cost_of_sale;

                if pos.quantity < QTY_EPSILON {
                    pos.quantity = Decimal::ZERO;
                    pos.total_cost_krw = Decimal::ZERO;
                }
            }
        }

        pos.average_cost_krw = if pos.quantity > Decimal::ZERO {
            pos.total_cost_krw / pos.quantity
        } else {
            Decimal::ZERO
        };
    }

    inventory.retain(|_, pos| pos.quantity > Decimal::ZERO);
    inventory
}

/// Current portfolio snapshot: the read contract the strategy planners
/// consume. Identical to [`compute_positions`]; stated as its own entry
/// point because callers treat the snapshot as a distinct view and it is
/// always recomputed fresh, never cached here.
pub fn current_portfolio(
    records: &[TransactionRecord],
    country: Country,
    exclusions: &ExclusionList,
) -> BTreeMap<String, Position> {
    compute_positions(records, country, exclusions)
}

/// Per-symbol, per-account held quantities, for allocating a recommended
/// sale across the broker accounts that actually hold the shares.
/// Records without an account label fall under "-".
pub fn holdings_by_account(
    records: &[TransactionRecord],
    country: Country,
    exclusions: &ExclusionList,
) -> BTreeMap<String, BTreeMap<String, Decimal>> {
    let mut holdings: BTreeMap<String, BTreeMap<String, Decimal>> = BTreeMap::new();

    for tx in replay_order(records, country, exclusions) {
        let account = tx.account.clone().unwrap_or_else(|| "-".to_string());
        let qty = holdings
            .entry(tx.symbol.clone())
            .or_default()
            .entry(account)
            .or_insert(Decimal::ZERO);

        match tx.trade_type {
            TradeType::Buy => *qty += tx.quantity,
            TradeType::Sell => {
                *qty -= tx.quantity;
                if *qty < Decimal::ZERO {
                    *qty = Decimal::ZERO;
                }
            }
        }
    }

    for per_account in holdings.values_mut() {
        per_account.retain(|_, qty| *qty > Decimal::ZERO);
    }
    holdings.retain(|_, per_account| !per_account.is_empty());
    holdings
}
