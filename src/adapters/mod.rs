//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - CoinGecko: crypto prices by address or symbol
//! - Yahoo: equity quotes behind tokenized stocks
//! - Pools: GeckoTerminal pool TVL and volume
//! - Jupiter: Solana token metadata and prices
//! - Token lists: list download with retry and fallback
//! - Cache: TTL response cache shared by the clients
//! - HTTP: axum API server
//! - CLI: Command-line interface handlers

pub mod cache;
pub mod coingecko;
pub mod yahoo;
pub mod pools;
pub mod jupiter;
pub mod token_lists;
pub mod http;
pub mod cli;

pub use cache::SharedCache;
pub use coingecko::CoinGeckoClient;
pub use yahoo::YahooFinanceClient;
pub use pools::GeckoTerminalClient;
pub use jupiter::JupiterTokenClient;
pub use token_lists::TokenListFetcher;
pub use cli::CliApp;
