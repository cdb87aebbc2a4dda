//! End-to-end CLI tests driving the compiled binary over CSV fixtures

use anyhow::{Context, Result};
use assert_cmd::Command;
use predicates::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::io::Write;
use tempfile::NamedTempFile;

const HEADER: &str =
    "date,symbol,country,trade_type,quantity,unit_price,gross_amount,sell_amount,exchange_rate,account\n";

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn decimal_from_value(value: &Value) -> Result<Decimal> {
    if let Some(s) = value.as_str() {
        return Decimal::from_str_exact(s).context("invalid decimal string");
    }
    if let Some(f) = value.as_f64() {
        return Decimal::try_from(f).context("invalid decimal number");
    }
    Err(anyhow::anyhow!("expected decimal value"))
}

#[test]
fn test_portfolio_table_output() -> Result<()> {
    let file = write_csv(&format!(
        "{HEADER}\
         2025-01-02,SCHD,USA,매수,100,10,1000,,1300,ISA\n"
    ));

    Command::cargo_bin("baedang")?
        .args(["portfolio", file.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("SCHD"))
        .stdout(predicate::str::contains("13,000원"));

    Ok(())
}

#[test]
fn test_gains_json_output() -> Result<()> {
    let file = write_csv(&format!(
        "{HEADER}\
         2025-01-02,SCHD,USA,매수,100,10,1000,,1300,\n\
         2025-03-10,SCHD,USA,매도,50,15,750,750,1320,\n"
    ));

    let output = Command::cargo_bin("baedang")?
        .args(["gains", file.path().to_str().unwrap(), "--json"])
        .output()?;
    assert!(output.status.success());

    let summaries: Value = serde_json::from_slice(&output.stdout)?;
    let years = summaries.as_array().context("expected array")?;
    assert_eq!(years.len(), 1);

    let year = &years[0];
    assert_eq!(year["year"], 2025);
    assert_eq!(decimal_from_value(&year["total_realized_gain"])?, dec!(340000));
    assert_eq!(decimal_from_value(&year["total_proceeds"])?, dec!(990000));

    Ok(())
}

#[test]
fn test_plan_target_json_tax_numbers() -> Result<()> {
    let file = write_csv(&format!(
        "{HEADER}\
         2024-06-01,SCHD,USA,매수,100,3,300,,1000,\n"
    ));

    // avg 3,000 KRW; live $10 at FX 1300 = 13,000: gain 10,000/share.
    // Target 1,300,000 -> 100 shares, plan gain 1,000,000.
    // With 2,000,000 already realized: taxable 500,000, tax 110,000.
    let output = Command::cargo_bin("baedang")?
        .args([
            "plan",
            "target",
            file.path().to_str().unwrap(),
            "--amount",
            "1300000",
            "--fx",
            "1300",
            "--price",
            "SCHD=10",
            "--realized",
            "2000000",
            "--json",
        ])
        .output()?;
    assert!(output.status.success());

    let plan: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(plan["kind"], "Combined");
    assert_eq!(decimal_from_value(&plan["total_gain"])?, dec!(1000000));
    assert_eq!(decimal_from_value(&plan["tax"]["total_gain"])?, dec!(3000000));
    assert_eq!(decimal_from_value(&plan["tax"]["taxable_base"])?, dec!(500000));
    assert_eq!(decimal_from_value(&plan["tax"]["estimated_tax"])?, dec!(110000));

    Ok(())
}

#[test]
fn test_plan_target_rejects_unpriced_holdings() -> Result<()> {
    let file = write_csv(&format!(
        "{HEADER}\
         2024-06-01,SCHD,USA,매수,100,10,1000,,1300,\n\
         2024-06-01,VEA,USA,매수,100,15,1500,,1300,\n"
    ));

    Command::cargo_bin("baedang")?
        .args([
            "plan",
            "target",
            file.path().to_str().unwrap(),
            "--amount",
            "1000000",
            "--fx",
            "1300",
            "--price",
            "SCHD=11",
            "--realized",
            "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("VEA"));

    Ok(())
}

#[test]
fn test_plan_target_rejects_zero_fx_rate() -> Result<()> {
    let file = write_csv(&format!(
        "{HEADER}\
         2024-06-01,SCHD,USA,매수,100,10,1000,,1300,\n"
    ));

    Command::cargo_bin("baedang")?
        .args([
            "plan",
            "target",
            file.path().to_str().unwrap(),
            "--amount",
            "1000000",
            "--fx",
            "0",
            "--price",
            "SCHD=10",
            "--realized",
            "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exchange rate must be positive"));

    Ok(())
}

#[test]
fn test_health_exit_code_signals_issues() -> Result<()> {
    let clean = write_csv(&format!(
        "{HEADER}\
         2025-01-02,SCHD,USA,매수,100,10,1000,,1300,\n"
    ));
    Command::cargo_bin("baedang")?
        .args(["health", clean.path().to_str().unwrap()])
        .assert()
        .success();

    let dirty = write_csv(&format!(
        "{HEADER}\
         2025-01-02,SCHD,USA,매수,100,10,1000,,,\n"
    ));
    Command::cargo_bin("baedang")?
        .args(["health", dirty.path().to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("exchange rate"));

    Ok(())
}

#[test]
fn test_dividends_json_summary() -> Result<()> {
    let file = write_csv(
        "date,stock_name,quantity,current_price,dividend_per_share,tax_base\n\
         2025-01-15,TIGER미국배당,100,10000,50,50\n\
         2025-02-15,TIGER미국배당,100,10300,52,50\n",
    );

    let output = Command::cargo_bin("baedang")?
        .args(["dividends", file.path().to_str().unwrap(), "--json"])
        .output()?;
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout)?;
    // Per row: taxable 5,000, tax floor(5,000 x 0.154) = 770
    assert_eq!(
        decimal_from_value(&report["summary"]["total_tax_amount"])?,
        dec!(1540)
    );

    let records = report["records"].as_array().context("expected records")?;
    assert_eq!(decimal_from_value(&records[1]["price_change"])?, dec!(300));
    assert_eq!(decimal_from_value(&records[1]["dividend_change"])?, dec!(2));

    // Tax-free regime zeroes everything
    let output = Command::cargo_bin("baedang")?
        .args([
            "dividends",
            file.path().to_str().unwrap(),
            "--tax-free",
            "--json",
        ])
        .output()?;
    let report: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(
        decimal_from_value(&report["summary"]["total_tax_amount"])?,
        Decimal::ZERO
    );

    Ok(())
}
