use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use rust_decimal::Decimal;
use std::path::Path;
use tracing::warn;

use baedang::cli::{Cli, Commands, PlanCommands};
use baedang::config::Config;
use baedang::models::{AccountKind, Country, TransactionRecord};
use baedang::tax::PriceMap;
use baedang::{dividends, health, importers, pricing, reports, tax};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Portfolio { file } => handle_portfolio(&file, &config, cli.json),

        Commands::Gains { file, year } => handle_gains(&file, year, &config, cli.json),

        Commands::Plan { action } => match action {
            PlanCommands::Exemption {
                file,
                fx,
                prices,
                realized,
                fetch,
            } => handle_plan_exemption(&file, fx, prices, realized, fetch, &config, cli.json).await,
            PlanCommands::Target {
                file,
                amount,
                fx,
                prices,
                realized,
                fetch,
            } => {
                handle_plan_target(&file, amount, fx, prices, realized, fetch, &config, cli.json)
                    .await
            }
        },

        Commands::Dividends { file, tax_free } => {
            handle_dividends(&file, tax_free, &config, cli.json)
        }

        Commands::Health { file } => handle_health(&file, &config, cli.json),
    }
}

/// Load transactions, surfacing skipped rows without failing the command
fn load_transactions(path: &Path) -> Result<Vec<TransactionRecord>> {
    let (records, report) =
        importers::import_transactions(path).context("failed to import transactions")?;
    for skipped in &report.skipped {
        warn!("skipped row: {}", skipped);
    }
    Ok(records)
}

fn handle_portfolio(file: &Path, config: &Config, json: bool) -> Result<()> {
    let records = load_transactions(file)?;
    let positions = tax::current_portfolio(&records, Country::Usa, &config.exclusions);

    if json {
        let values: Vec<_> = positions.values().collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        println!("{}", reports::format_portfolio_table(&positions));
    }
    Ok(())
}

fn handle_gains(file: &Path, year: Option<i32>, config: &Config, json: bool) -> Result<()> {
    let records = load_transactions(file)?;
    let mut summaries = tax::realized_gains_by_year(&records, Country::Usa, &config.exclusions);
    if let Some(year) = year {
        summaries.retain(|s| s.year == year);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        println!("{}", reports::format_gains_report(&summaries));
    }
    Ok(())
}

/// Already-realized gain for the planners: the explicit flag when given,
/// otherwise the current calendar year's aggregated realized gain.
fn realized_or_current_year(
    records: &[TransactionRecord],
    config: &Config,
    realized: Option<Decimal>,
) -> Decimal {
    realized.unwrap_or_else(|| {
        let year = chrono::Local::now().date_naive().year();
        tax::realized_gain_for_year(records, Country::Usa, &config.exclusions, year)
    })
}

/// Merge explicit --price pairs with fetched quotes for any holding still
/// missing one. Explicit prices always win.
async fn assemble_prices(
    holdings: &[String],
    explicit: Vec<(String, Decimal)>,
    fetch: bool,
) -> Result<PriceMap> {
    let mut prices: PriceMap = explicit.into_iter().collect();

    if fetch {
        let missing: Vec<String> = holdings
            .iter()
            .filter(|s| !prices.contains_key(*s))
            .cloned()
            .collect();
        if !missing.is_empty() {
            let api_key = std::env::var("FINNHUB_API_KEY")
                .context("FINNHUB_API_KEY must be set to fetch prices")?;
            let fetched = pricing::fetch_batch(&missing, &api_key).await;
            for (symbol, price) in fetched {
                prices.entry(symbol).or_insert(price);
            }
        }
    }

    Ok(prices)
}

#[allow(clippy::too_many_arguments)]
async fn handle_plan_exemption(
    file: &Path,
    fx: Decimal,
    explicit_prices: Vec<(String, Decimal)>,
    realized: Option<Decimal>,
    fetch: bool,
    config: &Config,
    json: bool,
) -> Result<()> {
    let records = load_transactions(file)?;
    let portfolio = tax::current_portfolio(&records, Country::Usa, &config.exclusions);
    let symbols: Vec<String> = portfolio.keys().cloned().collect();
    let prices = assemble_prices(&symbols, explicit_prices, fetch).await?;
    let already_realized = realized_or_current_year(&records, config, realized);

    let plan =
        tax::build_exemption_fill_plan(&portfolio, &prices, fx, already_realized, &config.policy)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        let holdings = tax::holdings_by_account(&records, Country::Usa, &config.exclusions);
        println!("{}", reports::format_plan(&plan, &holdings));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_plan_target(
    file: &Path,
    amount: Decimal,
    fx: Decimal,
    explicit_prices: Vec<(String, Decimal)>,
    realized: Option<Decimal>,
    fetch: bool,
    config: &Config,
    json: bool,
) -> Result<()> {
    let records = load_transactions(file)?;
    let portfolio = tax::current_portfolio(&records, Country::Usa, &config.exclusions);
    let symbols: Vec<String> = portfolio.keys().cloned().collect();
    let prices = assemble_prices(&symbols, explicit_prices, fetch).await?;
    let already_realized = realized_or_current_year(&records, config, realized);

    let plan = tax::build_target_amount_plan(
        &portfolio,
        &prices,
        fx,
        amount,
        already_realized,
        &config.policy,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        let holdings = tax::holdings_by_account(&records, Country::Usa, &config.exclusions);
        println!("{}", reports::format_plan(&plan, &holdings));
    }
    Ok(())
}

fn handle_dividends(file: &Path, tax_free: bool, config: &Config, json: bool) -> Result<()> {
    let (records, report) =
        importers::import_dividends(file).context("failed to import dividends")?;
    for skipped in &report.skipped {
        warn!("skipped row: {}", skipped);
    }

    let account = if tax_free {
        AccountKind::TaxFree
    } else {
        AccountKind::General
    };
    let recalculated = dividends::recalculate(&records, account, &config.policy);
    let stats = dividends::summary(&recalculated);

    if json {
        let output = serde_json::json!({
            "records": recalculated,
            "summary": stats,
            "monthly": dividends::monthly_totals(&recalculated),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", reports::format_dividends_report(&recalculated, &stats));
    }
    Ok(())
}

fn handle_health(file: &Path, config: &Config, json: bool) -> Result<()> {
    let records = load_transactions(file)?;
    let mut issues = health::scan(&records, Country::Usa, &config.exclusions);
    issues.extend(health::scan(&records, Country::Kor, &config.exclusions));

    if json {
        println!("{}", serde_json::to_string_pretty(&issues)?);
    } else {
        println!("{}", reports::format_health_report(&issues));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
