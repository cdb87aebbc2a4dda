//! End-to-end engine tests: CSV import through positions, realized gains,
//! and strategy plans, exercising the whole pipeline the CLI drives.

use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Write;
use tempfile::NamedTempFile;

use baedang::config::{Config, ExclusionList, TaxPolicy};
use baedang::models::Country;
use baedang::tax::{
    build_exemption_fill_plan, build_target_amount_plan, current_portfolio, realized_gains_by_year,
    PriceMap, StrategyPlan,
};
use baedang::{health, importers};

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const HEADER: &str =
    "date,symbol,country,trade_type,quantity,unit_price,gross_amount,sell_amount,exchange_rate,account\n";

#[test]
fn test_csv_to_positions_and_gains() -> Result<()> {
    // The canonical scenario: buy 100 @ $10 (FX 1300), sell 50 @ $15
    // (FX 1320) with explicit proceeds of $750
    let file = write_csv(&format!(
        "{HEADER}\
         2025-01-02,SCHD,USA,매수,100,10,1000,,1300,ISA\n\
         2025-03-10,SCHD,USA,매도,50,15,750,750,1320,ISA\n"
    ));

    let (records, report) = importers::import_transactions(file.path())?;
    assert_eq!(report.imported, 2);

    let exclusions = ExclusionList::default();

    let positions = current_portfolio(&records, Country::Usa, &exclusions);
    let pos = &positions["SCHD"];
    assert_eq!(pos.quantity, dec!(50));
    assert_eq!(pos.total_cost_krw, dec!(650000));
    assert_eq!(pos.average_cost_krw, dec!(13000));

    let summaries = realized_gains_by_year(&records, Country::Usa, &exclusions);
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].year, 2025);
    assert_eq!(summaries[0].total_realized_gain, dec!(340000));
    assert_eq!(summaries[0].total_proceeds, dec!(990000));

    Ok(())
}

#[test]
fn test_excluded_instrument_is_invisible_to_the_engine() -> Result<()> {
    let file = write_csv(&format!(
        "{HEADER}\
         2025-01-02,외화-RP,USA,매수,1000,1,1000,,1300,\n\
         2025-02-02,외화-RP,USA,매도,1000,1,1000,,1310,\n\
         2025-01-02,SCHD,USA,매수,10,10,100,,1300,\n"
    ));

    let (records, _) = importers::import_transactions(file.path())?;
    let exclusions = ExclusionList::default();

    let positions = current_portfolio(&records, Country::Usa, &exclusions);
    assert_eq!(positions.len(), 1);
    assert!(positions.contains_key("SCHD"));

    let summaries = realized_gains_by_year(&records, Country::Usa, &exclusions);
    assert!(summaries.is_empty());

    Ok(())
}

#[test]
fn test_plans_over_imported_history() -> Result<()> {
    // Two positions: SCHD at a gain, VEA at a loss against live prices
    let file = write_csv(&format!(
        "{HEADER}\
         2024-06-01,SCHD,USA,매수,1000,10,10000,,1300,\n\
         2024-06-01,VEA,USA,매수,1000,15,15000,,1300,\n"
    ));

    let (records, _) = importers::import_transactions(file.path())?;
    let exclusions = ExclusionList::default();
    let policy = TaxPolicy::default();
    let portfolio = current_portfolio(&records, Country::Usa, &exclusions);

    let prices: PriceMap = [
        ("SCHD".to_string(), dec!(11)), // 14,300 KRW vs avg 13,000: +1,300/share
        ("VEA".to_string(), dec!(10)),  // 13,000 KRW vs avg 19,500: loss
    ]
    .into_iter()
    .collect();

    // Exemption fill: only the gain position shows up;
    // floor(2,500,000 / 1,300) = 1,923, capped at 1,000 held
    let plan =
        build_exemption_fill_plan(&portfolio, &prices, dec!(1300), Decimal::ZERO, &policy).unwrap();
    let StrategyPlan::Alternatives(set) = plan else {
        panic!("expected alternatives");
    };
    assert_eq!(set.options.len(), 1);
    assert_eq!(set.options[0].symbol, "SCHD");
    assert_eq!(set.options[0].sell_quantity, dec!(1000));

    // Target amount: the loss position must be consumed first
    let plan = build_target_amount_plan(
        &portfolio,
        &prices,
        dec!(1300),
        dec!(5000000),
        Decimal::ZERO,
        &policy,
    )
    .unwrap();
    let StrategyPlan::Combined(combined) = plan else {
        panic!("expected combined plan");
    };
    assert_eq!(combined.items[0].symbol, "VEA");

    Ok(())
}

#[test]
fn test_health_scan_over_imported_history() -> Result<()> {
    let file = write_csv(&format!(
        "{HEADER}\
         2025-01-02,SCHD,USA,매수,100,10,1000,,,\n\
         2025-02-02,SCHD,USA,매도,150,12,1800,,1300,\n"
    ));

    let (records, _) = importers::import_transactions(file.path())?;
    let issues = health::scan(&records, Country::Usa, &ExclusionList::default());

    // Missing FX on the buy, oversell on the sell
    assert_eq!(issues.len(), 2);

    Ok(())
}

#[test]
fn test_config_override_changes_plan_arithmetic() -> Result<()> {
    let config = Config::from_toml_str(
        r#"
        [policy]
        annual_exemption = "1000000"
        capital_gains_rate = "0.25"
        "#,
    )?;

    let file = write_csv(&format!(
        "{HEADER}\
         2024-06-01,SCHD,USA,매수,100,10,1000,,1300,\n"
    ));
    let (records, _) = importers::import_transactions(file.path())?;
    let portfolio = current_portfolio(&records, Country::Usa, &config.exclusions);
    let prices: PriceMap = [("SCHD".to_string(), dec!(20))].into_iter().collect();

    // avg 13,000, live 26,000: gain 13,000/share; sell all 100 -> 1,300,000
    let plan = build_target_amount_plan(
        &portfolio,
        &prices,
        dec!(1300),
        dec!(2600000),
        Decimal::ZERO,
        &config.policy,
    )
    .unwrap();

    let StrategyPlan::Combined(combined) = plan else {
        panic!("expected combined plan");
    };
    assert_eq!(combined.total_gain, dec!(1300000));
    assert_eq!(combined.tax.taxable_base, dec!(300000));
    assert_eq!(combined.tax.estimated_tax, dec!(75000));

    Ok(())
}
