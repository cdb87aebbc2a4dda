use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "baedang")]
#[command(
    version,
    about = "Korean dividend and US-equity bookkeeping with capital-gains tax planning"
)]
#[command(
    long_about = "Track buy/sell transactions and dividend receipts, derive weighted-average \
                  cost positions and realized gains by year, and plan sales around the annual \
                  capital-gains exemption."
)]
pub struct Cli {
    /// Path to a TOML config overriding tax policy and exclusions
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show current US-equity positions (weighted-average cost)
    Portfolio {
        /// Path to the transactions CSV file
        file: PathBuf,
    },

    /// Show realized gains grouped by calendar year
    Gains {
        /// Path to the transactions CSV file
        file: PathBuf,

        /// Restrict output to one year
        #[arg(long)]
        year: Option<i32>,
    },

    /// Build a sell plan over the current portfolio
    Plan {
        #[command(subcommand)]
        action: PlanCommands,
    },

    /// Recalculate and show dividend records with withholding tax
    Dividends {
        /// Path to the dividends CSV file
        file: PathBuf,

        /// Treat the account as tax-free (no withholding)
        #[arg(long)]
        tax_free: bool,
    },

    /// Scan the transaction history for data-quality issues
    Health {
        /// Path to the transactions CSV file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Per-symbol sell quantities that fill the remaining annual exemption
    Exemption {
        /// Path to the transactions CSV file
        file: PathBuf,

        /// Current USD/KRW exchange rate
        #[arg(long)]
        fx: Decimal,

        /// Live price as SYMBOL=USD (repeatable)
        #[arg(long = "price", value_parser = parse_price_spec)]
        prices: Vec<(String, Decimal)>,

        /// Gain already realized this year (KRW); defaults to the
        /// current year's realized gain from the same history
        #[arg(long)]
        realized: Option<Decimal>,

        /// Fetch missing prices from Finnhub (FINNHUB_API_KEY env)
        #[arg(long)]
        fetch: bool,
    },

    /// One combined plan raising a target amount while minimizing tax
    Target {
        /// Path to the transactions CSV file
        file: PathBuf,

        /// Target proceeds in KRW
        #[arg(long)]
        amount: Decimal,

        /// Current USD/KRW exchange rate
        #[arg(long)]
        fx: Decimal,

        /// Live price as SYMBOL=USD (repeatable)
        #[arg(long = "price", value_parser = parse_price_spec)]
        prices: Vec<(String, Decimal)>,

        /// Gain already realized this year (KRW); defaults to the
        /// current year's realized gain from the same history
        #[arg(long)]
        realized: Option<Decimal>,

        /// Fetch missing prices from Finnhub (FINNHUB_API_KEY env)
        #[arg(long)]
        fetch: bool,
    },
}

/// Parse a SYMBOL=PRICE argument
fn parse_price_spec(raw: &str) -> Result<(String, Decimal), String> {
    let (symbol, price) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SYMBOL=PRICE, got {:?}", raw))?;
    let price: Decimal = price
        .trim()
        .parse()
        .map_err(|_| format!("invalid price in {:?}", raw))?;
    if symbol.trim().is_empty() {
        return Err(format!("empty symbol in {:?}", raw));
    }
    Ok((symbol.trim().to_string(), price))
}
