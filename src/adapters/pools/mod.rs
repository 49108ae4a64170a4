//! DEX Pool Statistics Adapter
//!
//! Aggregates TVL and 24h volume over every pool that trades a token, using
//! GeckoTerminal's per-token pool listing. Implements
//! [`PoolStatsSource`](crate::ports::PoolStatsSource).

mod geckoterminal;

pub use geckoterminal::{aggregate_pools, GeckoTerminalClient, PoolStatsConfig, PoolStatsError};
