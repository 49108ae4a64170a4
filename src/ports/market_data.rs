use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Chain, PoolStats, PriceQuote, SolanaTokenData, StockQuote};

/// Upstream data source error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Upstream returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Rate limited by upstream")]
    RateLimited,

    #[error("Data parsing error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Crypto price lookups (CoinGecko)
///
/// `Ok(None)` means the upstream answered but has no price for the query.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn price_by_address(
        &self,
        chain: Chain,
        address: &str,
    ) -> Result<Option<PriceQuote>, SourceError>;

    async fn price_by_symbol(&self, symbol: &str) -> Result<Option<PriceQuote>, SourceError>;
}

/// Equity quotes (Yahoo Finance)
#[async_trait]
pub trait StockQuoteSource: Send + Sync {
    async fn get_quote(&self, ticker: &str) -> Result<StockQuote, SourceError>;
}

/// DEX pool liquidity statistics
#[async_trait]
pub trait PoolStatsSource: Send + Sync {
    async fn get_pool_stats(&self, chain: Chain, address: &str) -> Result<PoolStats, SourceError>;
}

/// Solana token metadata and prices (Jupiter)
#[async_trait]
pub trait SolanaTokenSource: Send + Sync {
    /// Price a single mint, `Ok(None)` when the mint has no price
    async fn price_by_mint(&self, mint: &str) -> Result<Option<PriceQuote>, SourceError>;

    /// Metadata and prices for several mints
    ///
    /// Returned entries are in the order of `mints`; unknown mints come back
    /// with every optional field empty.
    async fn batch_token_data(&self, mints: &[String]) -> Result<Vec<SolanaTokenData>, SourceError>;
}
