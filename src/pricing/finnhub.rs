//! Finnhub quote client
//!
//! Single-quote and batch lookups against the Finnhub free API. The batch
//! variant tolerates partial failure: symbols that fail or return no data
//! are simply absent from the result map, never a process-wide fault.

use anyhow::{Context, Result};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::LedgerError;
use crate::tax::PriceMap;

/// Maximum concurrent API requests to stay inside the free-tier rate limit
const MAX_CONCURRENT_REQUESTS: usize = 5;

#[derive(Debug, Deserialize)]
struct FinnhubQuote {
    /// Current price
    c: f64,
    /// Previous close
    pc: f64,
}

/// Strip the Korean description suffix from an entry-form symbol,
/// e.g. "SMH-반도체" -> "SMH".
pub fn clean_symbol(symbol: &str) -> &str {
    symbol.split('-').next().unwrap_or(symbol).trim()
}

/// Fetch the current price of one symbol. `Ok(None)` means the symbol is
/// unknown or has no quote data; transport/API failures are errors.
pub async fn fetch_quote(client: &Client, symbol: &str, api_key: &str) -> Result<Option<Decimal>> {
    let ticker = clean_symbol(symbol);
    info!("Fetching quote for {} from Finnhub", ticker);

    let url = format!(
        "https://finnhub.io/api/v1/quote?symbol={}&token={}",
        ticker, api_key
    );

    let response = client
        .get(&url)
        .send()
        .await
        .context("Failed to send request to Finnhub")?;

    if !response.status().is_success() {
        return Err(LedgerError::Pricing(format!(
            "Finnhub returned error status: {}",
            response.status()
        ))
        .into());
    }

    let quote: FinnhubQuote = response
        .json()
        .await
        .context("Failed to parse Finnhub response")?;

    // Finnhub reports 0/0 for unknown symbols rather than an error status
    if quote.c == 0.0 && quote.pc == 0.0 {
        warn!("No quote data for {}, symbol may be invalid", ticker);
        return Ok(None);
    }

    let price = Decimal::from_f64_retain(quote.c).ok_or_else(|| {
        LedgerError::Pricing(format!("Unrepresentable price for {}: {}", ticker, quote.c))
    })?;
    Ok(Some(price))
}

/// Fetch prices for many symbols concurrently, keyed by the original
/// (uncleaned) symbol. Failed or unknown symbols are logged and omitted.
pub async fn fetch_batch(symbols: &[String], api_key: &str) -> PriceMap {
    let client = Client::new();
    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS));
    let mut join_set: JoinSet<(String, Option<Decimal>)> = JoinSet::new();

    for symbol in symbols {
        let client = client.clone();
        let semaphore = Arc::clone(&semaphore);
        let symbol = symbol.clone();
        let api_key = api_key.to_string();

        join_set.spawn(async move {
            let _permit = semaphore.acquire().await.expect("semaphore closed");
            match fetch_quote(&client, &symbol, &api_key).await {
                Ok(price) => (symbol, price),
                Err(e) => {
                    warn!("Price fetch failed for {}: {}", symbol, e);
                    (symbol, None)
                }
            }
        });
    }

    let mut results: PriceMap = HashMap::new();
    while let Some(joined) = join_set.join_next().await {
        if let Ok((symbol, Some(price))) = joined {
            results.insert(symbol, price);
        }
    }
    results
}
