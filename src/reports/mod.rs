//! Terminal rendering of engine output
//!
//! Separates presentation from calculation: every function here takes
//! already-derived values and produces a string. Tables via tabled,
//! accents via colored, JSON via serde_json on the derived types.

use colored::Colorize;
use itertools::Itertools;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tabled::{settings::Style, Table, Tabled};

use crate::dividends::SummaryStats;
use crate::health::HealthIssue;
use crate::models::{DividendRecord, Position, RealizedGainYearSummary};
use crate::tax::{SellRecommendation, StrategyPlan};
use crate::utils::{format_krw, format_usd};

/// Split a recommended sale across the broker accounts holding the symbol,
/// largest holding first. Returns (account, quantity) pairs; any shortfall
/// beyond the tracked holdings is silently left unallocated.
pub fn allocate_across_accounts(
    sell_quantity: Decimal,
    per_account: &BTreeMap<String, Decimal>,
) -> Vec<(String, Decimal)> {
    let mut accounts: Vec<(&String, &Decimal)> = per_account.iter().collect();
    accounts.sort_by(|a, b| b.1.cmp(a.1));

    let mut remaining = sell_quantity;
    let mut allocations = Vec::new();
    for (account, held) in accounts {
        if remaining <= Decimal::ZERO {
            break;
        }
        let take = remaining.min(*held);
        if take > Decimal::ZERO {
            allocations.push((account.clone(), take));
            remaining -= take;
        }
    }
    allocations
}

fn account_display(
    symbol: &str,
    sell_quantity: Decimal,
    holdings: &BTreeMap<String, BTreeMap<String, Decimal>>,
) -> String {
    match holdings.get(symbol) {
        Some(per_account) if !per_account.is_empty() => {
            allocate_across_accounts(sell_quantity, per_account)
                .into_iter()
                .map(|(account, qty)| format!("{}({})", account, qty))
                .join(", ")
        }
        _ => "-".to_string(),
    }
}

#[derive(Tabled)]
struct PositionRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Avg Cost (KRW)")]
    average_cost: String,
    #[tabled(rename = "Total Cost (KRW)")]
    total_cost: String,
}

/// Current holdings table
pub fn format_portfolio_table(positions: &BTreeMap<String, Position>) -> String {
    if positions.is_empty() {
        return format!("{} No current holdings\n", "ℹ".blue().bold());
    }

    let rows: Vec<PositionRow> = positions
        .values()
        .map(|p| PositionRow {
            symbol: p.symbol.clone(),
            quantity: p.quantity.to_string(),
            average_cost: format_krw(p.average_cost_krw),
            total_cost: format_krw(p.total_cost_krw),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    let total: Decimal = positions.values().map(|p| p.total_cost_krw).sum();
    format!(
        "\n{} Current Portfolio\n\n{}\n\n  Total cost basis: {}\n",
        "📊".cyan().bold(),
        table,
        format_krw(total).bold()
    )
}

#[derive(Tabled)]
struct GainEventRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Qty")]
    quantity: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "FX")]
    fx: String,
    #[tabled(rename = "Proceeds (KRW)")]
    proceeds: String,
    #[tabled(rename = "Gain (KRW)")]
    gain: String,
}

/// Realized gains by year, one table per year
pub fn format_gains_report(summaries: &[RealizedGainYearSummary]) -> String {
    if summaries.is_empty() {
        return format!("{} No realized gains in history\n", "ℹ".blue().bold());
    }

    let mut output = String::new();
    for summary in summaries {
        let rows: Vec<GainEventRow> = summary
            .events
            .iter()
            .map(|e| GainEventRow {
                date: e.date.to_string(),
                symbol: e.symbol.clone(),
                quantity: e.sold_quantity.to_string(),
                price: format_usd(e.unit_price_native),
                fx: e.exchange_rate.to_string(),
                proceeds: format_krw(e.proceeds_krw),
                gain: format_krw(e.realized_gain_krw),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        let gain_display = if summary.total_realized_gain >= Decimal::ZERO {
            format_krw(summary.total_realized_gain).green().to_string()
        } else {
            format_krw(summary.total_realized_gain).red().to_string()
        };
        output.push_str(&format!(
            "\n{} {} realized gains\n\n{}\n\n  Total proceeds: {}   Total gain: {}\n",
            "📅".cyan().bold(),
            summary.year,
            table,
            format_krw(summary.total_proceeds),
            gain_display
        ));
    }
    output
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Accounts")]
    accounts: String,
    #[tabled(rename = "Sell Qty")]
    sell_quantity: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Proceeds (KRW)")]
    proceeds: String,
    #[tabled(rename = "Gain (KRW)")]
    gain: String,
}

fn plan_rows(
    items: &[SellRecommendation],
    holdings: &BTreeMap<String, BTreeMap<String, Decimal>>,
) -> Vec<PlanRow> {
    items
        .iter()
        .map(|item| PlanRow {
            symbol: item.symbol.clone(),
            accounts: account_display(&item.symbol, item.sell_quantity, holdings),
            sell_quantity: item.sell_quantity.to_string(),
            price: format_usd(item.price_native),
            proceeds: format_krw(item.proceeds_krw),
            gain: format_krw(item.realized_gain_krw),
        })
        .collect()
}

/// Strategy plan rendering. The two plan kinds read differently on
/// purpose: alternatives are labelled as mutually exclusive options with
/// no totals line, a combined plan gets totals and the tax estimate.
pub fn format_plan(
    plan: &StrategyPlan,
    holdings: &BTreeMap<String, BTreeMap<String, Decimal>>,
) -> String {
    match plan {
        StrategyPlan::Alternatives(set) => {
            if set.options.is_empty() {
                return format!(
                    "{} [{}] no symbol can use the remaining exemption ({})\n",
                    "ℹ".blue().bold(),
                    set.strategy_name,
                    format_krw(set.remaining_exemption)
                );
            }
            let table = Table::new(plan_rows(&set.options, holdings))
                .with(Style::rounded())
                .to_string();
            format!(
                "\n{} [{}]\n  {}\n\n{}\n\n  {} Each row is an independent option; do not execute them together.\n",
                "🎯".cyan().bold(),
                set.strategy_name.bold(),
                set.description,
                table,
                "⚠".yellow().bold()
            )
        }
        StrategyPlan::Combined(combined) => {
            let table = Table::new(plan_rows(&combined.items, holdings))
                .with(Style::rounded())
                .to_string();
            let mut output = format!(
                "\n{} [{}]\n  {}\n\n{}\n\n  Total proceeds: {}   Plan gain: {}\n",
                "🎯".cyan().bold(),
                combined.strategy_name.bold(),
                combined.description,
                table,
                format_krw(combined.total_proceeds).bold(),
                format_krw(combined.total_gain)
            );
            output.push_str(&format!(
                "  Year total gain: {}   Taxable base: {}   Estimated tax: {}\n",
                format_krw(combined.tax.total_gain),
                format_krw(combined.tax.taxable_base),
                format_krw(combined.tax.estimated_tax).red().bold()
            ));
            output
        }
    }
}

#[derive(Tabled)]
struct DividendRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Stock")]
    stock: String,
    #[tabled(rename = "Qty")]
    quantity: String,
    #[tabled(rename = "Price Δ")]
    price_change: String,
    #[tabled(rename = "Div/Share Δ")]
    dividend_change: String,
    #[tabled(rename = "Taxable (KRW)")]
    taxable: String,
    #[tabled(rename = "Tax (KRW)")]
    tax: String,
}

/// Recalculated dividend rows plus totals
pub fn format_dividends_report(records: &[DividendRecord], stats: &SummaryStats) -> String {
    if records.is_empty() {
        return format!("{} No dividend records\n", "ℹ".blue().bold());
    }

    let rows: Vec<DividendRow> = records
        .iter()
        .map(|r| DividendRow {
            date: r.date.to_string(),
            stock: r.stock_name.clone(),
            quantity: r.quantity.to_string(),
            price_change: r.price_change.to_string(),
            dividend_change: r.dividend_change.to_string(),
            taxable: format_krw(r.taxable_distribution),
            tax: format_krw(r.tax_amount),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    format!(
        "\n{} Dividend Records\n\n{}\n\n  Taxable: {}   Tax: {}   Received: {}\n",
        "💰".cyan().bold(),
        table,
        format_krw(stats.total_taxable_distribution),
        format_krw(stats.total_tax_amount),
        format_krw(stats.total_received).bold()
    )
}

/// Health-check findings, one line per issue
pub fn format_health_report(issues: &[HealthIssue]) -> String {
    if issues.is_empty() {
        return format!("{} No data-quality issues found\n", "✓".green().bold());
    }

    let mut output = format!(
        "{} {} data-quality issue(s) found:\n",
        "⚠".yellow().bold(),
        issues.len()
    );
    for issue in issues {
        output.push_str(&format!("  - {}\n", issue));
    }
    output
}
