//! CoinGecko Adapter
//!
//! Crypto prices by contract address or by symbol search. Implements
//! [`PriceSource`](crate::ports::PriceSource).

mod client;

pub use client::{CoinGeckoClient, CoinGeckoConfig, CoinGeckoError};
