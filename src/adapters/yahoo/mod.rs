//! Yahoo Finance Adapter
//!
//! Equity quotes for the tickers behind tokenized stocks. Implements
//! [`StockQuoteSource`](crate::ports::StockQuoteSource).

mod client;

pub use client::{is_valid_ticker, YahooConfig, YahooError, YahooFinanceClient};
