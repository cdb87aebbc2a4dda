// Tax module - weighted-average inventory, realized gains, sell-plan strategies

pub mod inventory;
pub mod realized;
pub mod strategy;

pub use inventory::{compute_positions, current_portfolio, holdings_by_account};
pub use realized::{realized_gain_for_year, realized_gains_by_year};
pub use strategy::{
    assess, build_exemption_fill_plan, build_target_amount_plan, validate_prices, AlternativeSet,
    CombinedPlan, PriceMap, SellRecommendation, StrategyPlan, TaxSummary,
};
