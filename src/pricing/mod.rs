// Pricing module - live quote lookups (Finnhub)

pub mod finnhub;

pub use finnhub::{clean_symbol, fetch_batch, fetch_quote};
