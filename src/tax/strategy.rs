//! Sell-plan strategies over the current portfolio snapshot
//!
//! Both planners are pure functions of (snapshot, live prices, FX rate,
//! already-realized gain, policy). The two produce structurally different
//! results: exemption-fill yields independent per-symbol what-ifs that must
//! not be summed, target-amount yields one combined executable plan. The
//! [`StrategyPlan`] enum keeps the two apart at the type level.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::config::TaxPolicy;
use crate::error::PlanError;
use crate::models::Position;

/// Live prices in native currency (USD), keyed by symbol
pub type PriceMap = HashMap<String, Decimal>;

/// One recommended sale, all derived amounts in KRW
#[derive(Debug, Clone, Serialize)]
pub struct SellRecommendation {
    pub symbol: String,
    pub sell_quantity: Decimal,
    pub price_native: Decimal,
    pub exchange_rate: Decimal,
    pub proceeds_krw: Decimal,
    pub cost_basis_krw: Decimal,
    pub realized_gain_krw: Decimal,
}

/// Year-level tax assessment for a plan
#[derive(Debug, Clone, Serialize)]
pub struct TaxSummary {
    /// Already-realized gain plus the plan's projected gain
    pub total_gain: Decimal,
    pub exemption_used: Decimal,
    pub taxable_base: Decimal,
    pub estimated_tax: Decimal,
}

/// Apply the annual exemption and flat rate to a year's net gain
pub fn assess(policy: &TaxPolicy, total_gain: Decimal) -> TaxSummary {
    let exemption_used = total_gain.max(Decimal::ZERO).min(policy.annual_exemption);
    let taxable_base = (total_gain - policy.annual_exemption).max(Decimal::ZERO);
    TaxSummary {
        total_gain,
        exemption_used,
        taxable_base,
        estimated_tax: taxable_base * policy.capital_gains_rate,
    }
}

/// Independent per-symbol sell options that fill the remaining exemption.
/// Options are mutually exclusive what-ifs; they carry no aggregate totals
/// because summing them has no meaning.
#[derive(Debug, Serialize)]
pub struct AlternativeSet {
    pub strategy_name: String,
    pub description: String,
    pub remaining_exemption: Decimal,
    pub options: Vec<SellRecommendation>,
    pub tax: TaxSummary,
}

/// One combined, executable sell plan with meaningful totals
#[derive(Debug, Serialize)]
pub struct CombinedPlan {
    pub strategy_name: String,
    pub description: String,
    pub items: Vec<SellRecommendation>,
    pub total_proceeds: Decimal,
    pub total_gain: Decimal,
    pub tax: TaxSummary,
}

/// Tagged plan result. Callers must match on the variant; alternative
/// options cannot be mistaken for a single combined trade.
#[derive(Debug, Serialize)]
#[serde(tag = "kind")]
pub enum StrategyPlan {
    Alternatives(AlternativeSet),
    Combined(CombinedPlan),
}

/// For each held symbol independently, the maximum share count sellable
/// without the year's realized gain exceeding the annual exemption.
///
/// Loss positions and unpriced symbols are skipped per-symbol: each option
/// is an independent alternative, so one missing price does not fail the
/// whole call. A non-positive FX rate is a caller error rejected up front.
pub fn build_exemption_fill_plan(
    portfolio: &BTreeMap<String, Position>,
    prices: &PriceMap,
    fx_rate: Decimal,
    already_realized_gain: Decimal,
    policy: &TaxPolicy,
) -> Result<StrategyPlan, PlanError> {
    if fx_rate <= Decimal::ZERO {
        return Err(PlanError::NonPositiveFxRate(fx_rate));
    }

    let remaining = policy.remaining_exemption(already_realized_gain);
    let mut options = Vec::new();

    for item in portfolio.values() {
        let Some(&price) = prices.get(&item.symbol) else {
            continue;
        };
        if price <= Decimal::ZERO {
            continue;
        }

        let price_krw = price * fx_rate;
        let gain_per_share = price_krw - item.average_cost_krw;
        if gain_per_share <= Decimal::ZERO {
            continue;
        }

        let max_qty_for_exemption = (remaining / gain_per_share).floor();
        let sell_qty = item.quantity.min(max_qty_for_exemption);
        if sell_qty <= Decimal::ZERO {
            continue;
        }

        let proceeds = sell_qty * price_krw;
        let cost = sell_qty * item.average_cost_krw;
        options.push(SellRecommendation {
            symbol: item.symbol.clone(),
            sell_quantity: sell_qty,
            price_native: price,
            exchange_rate: fx_rate,
            proceeds_krw: proceeds,
            cost_basis_krw: cost,
            realized_gain_krw: proceeds - cost,
        });
    }

    // The plan itself realizes nothing; the assessment reflects only what
    // the year has already realized.
    Ok(StrategyPlan::Alternatives(AlternativeSet {
        strategy_name: "비과세 한도 채우기 (단일 종목 기준)".to_string(),
        description: format!(
            "Per-symbol sell quantities that fill the remaining annual exemption \
             of {} KRW. Options are independent alternatives, not a combined trade.",
            remaining.round()
        ),
        remaining_exemption: remaining,
        options,
        tax: assess(policy, already_realized_gain),
    }))
}

/// Greedy tax-minimizing plan that raises `target_amount_krw` in proceeds.
///
/// Candidates are sold in ascending gain-ratio order (losses first), since
/// tax is levied on gain, not proceeds. Under-fill is tolerated when the
/// portfolio cannot cover the target. Preconditions are rejected before any
/// planning: non-positive targets, a non-positive FX rate, and any held
/// symbol without a usable live price (the offending symbols are listed
/// for user display).
pub fn build_target_amount_plan(
    portfolio: &BTreeMap<String, Position>,
    prices: &PriceMap,
    fx_rate: Decimal,
    target_amount_krw: Decimal,
    already_realized_gain: Decimal,
    policy: &TaxPolicy,
) -> Result<StrategyPlan, PlanError> {
    if target_amount_krw <= Decimal::ZERO {
        return Err(PlanError::NonPositiveTarget(target_amount_krw));
    }
    if fx_rate <= Decimal::ZERO {
        return Err(PlanError::NonPositiveFxRate(fx_rate));
    }
    validate_prices(portfolio, prices)?;

    struct Candidate<'a> {
        position: &'a Position,
        price_native: Decimal,
        price_krw: Decimal,
        gain_ratio: Decimal,
    }

    let mut candidates: Vec<Candidate> = portfolio
        .values()
        .filter(|p| p.quantity > Decimal::ZERO)
        .map(|p| {
            let price_native = prices[&p.symbol];
            let price_krw = price_native * fx_rate;
            Candidate {
                position: p,
                price_native,
                price_krw,
                gain_ratio: (price_krw - p.average_cost_krw) / price_krw,
            }
        })
        .collect();

    candidates.sort_by(|a, b| a.gain_ratio.cmp(&b.gain_ratio));

    let mut items = Vec::new();
    let mut total_proceeds = Decimal::ZERO;
    let mut total_gain = Decimal::ZERO;

    for cand in candidates {
        if total_proceeds >= target_amount_krw {
            break;
        }

        let needed = target_amount_krw - total_proceeds;
        let shares_needed = (needed / cand.price_krw).ceil();
        let sell_qty = cand.position.quantity.min(shares_needed);

        let proceeds = sell_qty * cand.price_krw;
        let cost = sell_qty * cand.position.average_cost_krw;
        let gain = proceeds - cost;

        total_proceeds += proceeds;
        total_gain += gain;

        items.push(SellRecommendation {
            symbol: cand.position.symbol.clone(),
            sell_quantity: sell_qty,
            price_native: cand.price_native,
            exchange_rate: fx_rate,
            proceeds_krw: proceeds,
            cost_basis_krw: cost,
            realized_gain_krw: gain,
        });
    }

    let tax = assess(policy, already_realized_gain + total_gain);

    Ok(StrategyPlan::Combined(CombinedPlan {
        strategy_name: format!("목표 금액 확보 ({} KRW)", target_amount_krw.round()),
        description: "Sell order chosen to minimize tax: losses first, then \
                      lowest gain-ratio positions."
            .to_string(),
        items,
        total_proceeds,
        total_gain,
        tax,
    }))
}

/// Pre-flight check that every held symbol has a positive live price.
/// Returns all offending symbols at once so the caller can display the
/// complete list instead of failing one symbol at a time.
pub fn validate_prices(
    portfolio: &BTreeMap<String, Position>,
    prices: &PriceMap,
) -> Result<(), PlanError> {
    let missing: Vec<String> = portfolio
        .values()
        .filter(|p| {
            prices
                .get(&p.symbol)
                .map_or(true, |price| *price <= Decimal::ZERO)
        })
        .map(|p| p.symbol.clone())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PlanError::MissingPrices(missing))
    }
}
