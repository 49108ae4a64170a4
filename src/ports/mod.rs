//! Ports Layer - Trait definitions for external dependencies
//!
//! Each upstream the token page reads from sits behind one of these traits so
//! the orchestrator and the HTTP layer can run against in-memory mocks:
//! - Crypto prices (CoinGecko)
//! - Equity quotes (Yahoo Finance)
//! - DEX pool statistics (GeckoTerminal)
//! - Solana token data (Jupiter)

pub mod market_data;
pub mod mocks;

pub use market_data::{PoolStatsSource, PriceSource, SolanaTokenSource, SourceError, StockQuoteSource};
