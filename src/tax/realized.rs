//! Realized-gain aggregation by calendar year
//!
//! Independent replay of the same transaction stream the inventory tracker
//! consumes. Each sell emits a gain event costed at the weighted-average
//! cost of the position at that moment, before the position is reduced.

use chrono::Datelike;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::warn;

use crate::config::ExclusionList;
use crate::models::{
    Country, Position, RealizedGainEvent, RealizedGainYearSummary, TradeType, TransactionRecord,
};

use super::inventory::{replay_order, QTY_EPSILON};

/// Replay the history and group realized gains by calendar year,
/// newest year first. Years without any sell events are omitted.
pub fn realized_gains_by_year(
    records: &[TransactionRecord],
    country: Country,
    exclusions: &ExclusionList,
) -> Vec<RealizedGainYearSummary> {
    let mut inventory: BTreeMap<String, Position> = BTreeMap::new();
    let mut events: Vec<RealizedGainEvent> = Vec::new();

    for tx in replay_order(records, country, exclusions) {
        let pos = inventory
            .entry(tx.symbol.clone())
            .or_insert_with(|| Position::new(&tx.symbol));
        let fx = if tx.country.is_foreign() {
            tx.fx_or_zero()
        } else {
            Decimal::ONE
        };

        match tx.trade_type {
            TradeType::Buy => {
                pos.quantity += tx.quantity;
                pos.total_cost_krw += tx.gross_amount * fx;
            }
            TradeType::Sell => {
                if pos.quantity <= Decimal::ZERO {
                    warn!(
                        symbol = %tx.symbol,
                        date = %tx.date,
                        "sell without held quantity, no gain event emitted"
                    );
                    continue;
                }

                let avg_cost = pos.total_cost_krw / pos.quantity;
                let cost_basis = avg_cost * tx.quantity;
                let proceeds = tx.sell_proceeds_native() * fx;

                events.push(RealizedGainEvent {
                    year: tx.date.year(),
                    symbol: tx.symbol.clone(),
                    date: tx.date,
                    sold_quantity: tx.quantity,
                    unit_price_native: tx.unit_price,
                    exchange_rate: fx,
                    proceeds_krw: proceeds,
                    cost_basis_krw: cost_basis,
                    realized_gain_krw: proceeds - cost_basis,
                });

                pos.quantity -= tx.quantity;
                pos.total_cost_krw -= cost_basis;
                if pos.quantity < QTY_EPSILON {
                    pos.quantity = Decimal::ZERO;
                    pos.total_cost_krw = Decimal::ZERO;
                }
            }
        }
    }

    let mut by_year: BTreeMap<i32, RealizedGainYearSummary> = BTreeMap::new();
    for event in events {
        let summary = by_year
            .entry(event.year)
            .or_insert_with(|| RealizedGainYearSummary {
                year: event.year,
                total_realized_gain: Decimal::ZERO,
                total_proceeds: Decimal::ZERO,
                events: Vec::new(),
            });
        summary.total_realized_gain += event.realized_gain_krw;
        summary.total_proceeds += event.proceeds_krw;
        summary.events.push(event);
    }

    by_year.into_values().rev().collect()
}

/// Total gain already realized in one calendar year. Zero when the year has
/// no sell events. This is the planners' `already_realized_gain` input.
pub fn realized_gain_for_year(
    records: &[TransactionRecord],
    country: Country,
    exclusions: &ExclusionList,
    year: i32,
) -> Decimal {
    realized_gains_by_year(records, country, exclusions)
        .into_iter()
        .find(|s| s.year == year)
        .map(|s| s.total_realized_gain)
        .unwrap_or(Decimal::ZERO)
}
