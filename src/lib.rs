//! Token Pulse - token detail data service
//!
//! Serves what a token detail page renders: USD price with multi-source
//! fallback, tokenized stock quotes, DEX pool liquidity, chart symbols and
//! merged token lists.
//!
//! # Modules
//!
//! - `domain`: Core logic (chains, token lists, page params, chart symbols, page view)
//! - `ports`: Trait abstractions (PriceSource, StockQuoteSource, PoolStatsSource, SolanaTokenSource)
//! - `adapters`: External implementations (CoinGecko, Yahoo, GeckoTerminal, Jupiter, HTTP, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Token page orchestration

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
