use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;

use crate::domain::{
    Chain, PoolStats, PriceQuote, PriceSourceKind, Resolution, SolanaTokenData, StockQuote,
};
use super::market_data::{
    PoolStatsSource, PriceSource, SolanaTokenSource, SourceError, StockQuoteSource,
};

fn address_key(chain: Chain, address: &str) -> String {
    format!("{}:{}", chain.coingecko_platform(), chain.normalize_address(address))
}

/// Mock price source that records calls and allows controlled responses
#[derive(Debug, Default, Clone)]
pub struct MockPriceSource {
    calls: Arc<Mutex<Vec<String>>>,
    by_address: Arc<Mutex<HashMap<String, f64>>>,
    by_symbol: Arc<Mutex<HashMap<String, f64>>>,
    fail_all: bool,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set a price for an address on a chain
    pub fn with_address_price(self, chain: Chain, address: &str, price: f64) -> Self {
        self.by_address.lock().unwrap().insert(address_key(chain, address), price);
        self
    }

    /// Builder method to set a price for a symbol, matched exactly
    pub fn with_symbol_price(self, symbol: &str, price: f64) -> Self {
        self.by_symbol.lock().unwrap().insert(symbol.to_string(), price);
        self
    }

    /// Every call returns an HTTP error
    pub fn failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Get all recorded calls, e.g. `address:ethereum:0xabc` or `symbol:SOL`
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn price_by_address(
        &self,
        chain: Chain,
        address: &str,
    ) -> Result<Option<PriceQuote>, SourceError> {
        let key = address_key(chain, address);
        self.calls.lock().unwrap().push(format!("address:{}", key));
        if self.fail_all {
            return Err(SourceError::Http("mock failure".to_string()));
        }
        Ok(self.by_address.lock().unwrap().get(&key).map(|price| PriceQuote {
            price_usd: *price,
            price_change_24h: Some(1.5),
            volume_24h: Some(250_000.0),
            market_cap: Some(10_000_000.0),
            source: PriceSourceKind::CoinGecko,
            resolved_via: Resolution::Address {
                chain,
                address: address.to_string(),
            },
        }))
    }

    async fn price_by_symbol(&self, symbol: &str) -> Result<Option<PriceQuote>, SourceError> {
        self.calls.lock().unwrap().push(format!("symbol:{}", symbol));
        if self.fail_all {
            return Err(SourceError::Http("mock failure".to_string()));
        }
        Ok(self.by_symbol.lock().unwrap().get(symbol).map(|price| PriceQuote {
            price_usd: *price,
            price_change_24h: None,
            volume_24h: None,
            market_cap: None,
            source: PriceSourceKind::CoinGecko,
            resolved_via: Resolution::Symbol {
                coin_id: symbol.to_ascii_lowercase(),
            },
        }))
    }
}

/// Mock stock quote source
#[derive(Debug, Default, Clone)]
pub struct MockStockSource {
    calls: Arc<Mutex<Vec<String>>>,
    quotes: Arc<Mutex<HashMap<String, StockQuote>>>,
}

impl MockStockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set a quote with a price and previous close
    pub fn with_quote(self, ticker: &str, price: f64, previous_close: f64) -> Self {
        let quote = StockQuote {
            ticker: ticker.to_string(),
            price,
            previous_close: Some(previous_close),
            price_change_percent: crate::domain::market::percent_change(price, Some(previous_close)),
            currency: Some("USD".to_string()),
            exchange: Some("NMS".to_string()),
            day_high: None,
            day_low: None,
            volume: None,
        };
        self.quotes.lock().unwrap().insert(ticker.to_ascii_uppercase(), quote);
        self
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StockQuoteSource for MockStockSource {
    async fn get_quote(&self, ticker: &str) -> Result<StockQuote, SourceError> {
        self.calls.lock().unwrap().push(ticker.to_string());
        self.quotes
            .lock()
            .unwrap()
            .get(&ticker.to_ascii_uppercase())
            .cloned()
            .ok_or_else(|| SourceError::NotFound(ticker.to_string()))
    }
}

/// Mock pool statistics source
#[derive(Debug, Default, Clone)]
pub struct MockPoolSource {
    calls: Arc<Mutex<Vec<String>>>,
    stats: Arc<Mutex<HashMap<String, PoolStats>>>,
}

impl MockPoolSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(self, chain: Chain, address: &str, tvl_usd: f64, volume_24h_usd: f64) -> Self {
        self.stats.lock().unwrap().insert(
            address_key(chain, address),
            PoolStats {
                tvl_usd,
                volume_24h_usd,
                pool_count: 1,
            },
        );
        self
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PoolStatsSource for MockPoolSource {
    async fn get_pool_stats(&self, chain: Chain, address: &str) -> Result<PoolStats, SourceError> {
        let key = address_key(chain, address);
        self.calls.lock().unwrap().push(key.clone());
        self.stats
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| SourceError::Status {
                status: 500,
                message: "mock pool failure".to_string(),
            })
    }
}

/// Mock Solana token source
#[derive(Debug, Default, Clone)]
pub struct MockSolanaSource {
    calls: Arc<Mutex<Vec<String>>>,
    tokens: Arc<Mutex<HashMap<String, SolanaTokenData>>>,
}

impl MockSolanaSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(self, mint: &str, symbol: &str, price_usd: Option<f64>) -> Self {
        self.tokens.lock().unwrap().insert(
            mint.to_string(),
            SolanaTokenData {
                address: mint.to_string(),
                symbol: Some(symbol.to_string()),
                name: Some(format!("{} Token", symbol)),
                decimals: Some(9),
                logo_uri: None,
                price_usd,
            },
        );
        self
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SolanaTokenSource for MockSolanaSource {
    async fn price_by_mint(&self, mint: &str) -> Result<Option<PriceQuote>, SourceError> {
        self.calls.lock().unwrap().push(format!("mint:{}", mint));
        let price = self
            .tokens
            .lock()
            .unwrap()
            .get(mint)
            .and_then(|t| t.price_usd);
        Ok(price.map(|price_usd| PriceQuote {
            price_usd,
            price_change_24h: None,
            volume_24h: None,
            market_cap: None,
            source: PriceSourceKind::Jupiter,
            resolved_via: Resolution::SolanaMint {
                mint: mint.to_string(),
            },
        }))
    }

    async fn batch_token_data(&self, mints: &[String]) -> Result<Vec<SolanaTokenData>, SourceError> {
        self.calls.lock().unwrap().push(format!("batch:{}", mints.len()));
        let tokens = self.tokens.lock().unwrap();
        Ok(mints
            .iter()
            .map(|mint| {
                tokens
                    .get(mint)
                    .cloned()
                    .unwrap_or_else(|| SolanaTokenData::empty(mint.as_str()))
            })
            .collect())
    }
}
