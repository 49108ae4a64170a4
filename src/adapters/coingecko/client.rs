//! CoinGecko API client
//!
//! # Endpoints Used
//! - `/simple/token_price/{platform}`: price by contract address
//! - `/search`: coin id lookup by symbol
//! - `/simple/price`: price by coin id
//!
//! Raw responses are cached in the shared TTL cache keyed by request URL.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::adapters::cache::SharedCache;
use crate::domain::market::non_negative;
use crate::domain::{Chain, PriceQuote, PriceSourceKind, Resolution};
use crate::ports::{PriceSource, SourceError};

#[derive(Debug, Error)]
pub enum CoinGeckoError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, try again later")]
    RateLimited,

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },
}

impl From<CoinGeckoError> for SourceError {
    fn from(e: CoinGeckoError) -> Self {
        match e {
            CoinGeckoError::HttpError(e) => SourceError::Http(e.to_string()),
            CoinGeckoError::InvalidUrl(msg) => SourceError::Parse(msg),
            CoinGeckoError::ParseError(msg) => SourceError::Parse(msg),
            CoinGeckoError::RateLimited => SourceError::RateLimited,
            CoinGeckoError::ApiError { status, message } => SourceError::Status { status, message },
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub api_url: String,
    /// Demo or pro API key; pro keys are sent when `api_url` is the pro host
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub cache_ttl: Duration,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.coingecko.com/api/v3".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(60),
        }
    }
}

impl CoinGeckoConfig {
    fn api_key_header(&self) -> &'static str {
        if self.api_url.contains("pro-api.coingecko.com") {
            "x-cg-pro-api-key"
        } else {
            "x-cg-demo-api-key"
        }
    }
}

/// USD fields CoinGecko returns for each priced asset
#[derive(Debug, Clone, Deserialize)]
struct UsdFields {
    usd: Option<f64>,
    usd_market_cap: Option<f64>,
    usd_24h_vol: Option<f64>,
    usd_24h_change: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchCoin {
    id: String,
    symbol: String,
    #[allow(dead_code)]
    name: String,
}

#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    config: CoinGeckoConfig,
    http: Client,
    cache: SharedCache<Value>,
}

impl CoinGeckoClient {
    pub fn new(config: CoinGeckoConfig, cache: SharedCache<Value>) -> Result<Self, CoinGeckoError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http, cache })
    }

    /// Price by contract address on a chain's platform
    pub async fn token_price(
        &self,
        chain: Chain,
        address: &str,
    ) -> Result<Option<PriceQuote>, CoinGeckoError> {
        let url = build_url(
            &format!("{}/simple/token_price/{}", self.config.api_url, chain.coingecko_platform()),
            &[
                ("contract_addresses", address),
                ("vs_currencies", "usd"),
                ("include_market_cap", "true"),
                ("include_24hr_vol", "true"),
                ("include_24hr_change", "true"),
            ],
        )?;
        let body = self.get_cached(url).await?;

        let wanted = chain.normalize_address(address);
        let fields = body
            .as_object()
            .and_then(|map| {
                map.iter()
                    .find(|(key, _)| chain.normalize_address(key) == wanted)
                    .map(|(_, v)| v.clone())
            });

        let Some(fields) = fields else {
            return Ok(None);
        };

        let resolution = Resolution::Address {
            chain,
            address: address.to_string(),
        };
        Ok(to_quote(parse_fields(fields)?, resolution))
    }

    /// Resolve a symbol to a CoinGecko coin id through `/search`
    pub async fn search_coin_id(&self, symbol: &str) -> Result<Option<String>, CoinGeckoError> {
        let url = build_url(
            &format!("{}/search", self.config.api_url),
            &[("query", symbol)],
        )?;
        let body = self.get_cached(url).await?;
        let search: SearchResponse = serde_json::from_value(body)
            .map_err(|e| CoinGeckoError::ParseError(format!("Failed to parse search results: {}", e)))?;

        Ok(search
            .coins
            .into_iter()
            .find(|c| c.symbol.eq_ignore_ascii_case(symbol))
            .map(|c| c.id))
    }

    /// Price by coin id
    pub async fn coin_price(&self, coin_id: &str) -> Result<Option<PriceQuote>, CoinGeckoError> {
        let url = build_url(
            &format!("{}/simple/price", self.config.api_url),
            &[
                ("ids", coin_id),
                ("vs_currencies", "usd"),
                ("include_market_cap", "true"),
                ("include_24hr_vol", "true"),
                ("include_24hr_change", "true"),
            ],
        )?;
        let body = self.get_cached(url).await?;

        let Some(fields) = body.get(coin_id).cloned() else {
            return Ok(None);
        };

        let resolution = Resolution::Symbol {
            coin_id: coin_id.to_string(),
        };
        Ok(to_quote(parse_fields(fields)?, resolution))
    }

    async fn get_cached(&self, url: Url) -> Result<Value, CoinGeckoError> {
        let key = format!("coingecko:{}", url);
        self.cache
            .get_or_try_insert_with(&key, self.config.cache_ttl, || self.execute_request(url))
            .await
    }

    async fn execute_request(&self, url: Url) -> Result<Value, CoinGeckoError> {
        tracing::debug!(%url, "CoinGecko request");
        let mut req = self.http.get(url).header("accept", "application/json");
        if let Some(ref api_key) = self.config.api_key {
            req = req.header(self.config.api_key_header(), api_key);
        }

        let response = req.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("CoinGecko rate limited (429)");
            return Err(CoinGeckoError::RateLimited);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CoinGeckoError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CoinGeckoError::ParseError(e.to_string()))
    }
}

fn build_url(base: &str, params: &[(&str, &str)]) -> Result<Url, CoinGeckoError> {
    Url::parse_with_params(base, params).map_err(|e| CoinGeckoError::InvalidUrl(format!("{}: {}", base, e)))
}

fn parse_fields(value: Value) -> Result<UsdFields, CoinGeckoError> {
    serde_json::from_value(value)
        .map_err(|e| CoinGeckoError::ParseError(format!("Failed to parse price fields: {}", e)))
}

fn to_quote(fields: UsdFields, resolved_via: Resolution) -> Option<PriceQuote> {
    let price_usd = non_negative(fields.usd)?;
    Some(PriceQuote {
        price_usd,
        price_change_24h: fields.usd_24h_change.filter(|v| v.is_finite()),
        volume_24h: non_negative(fields.usd_24h_vol),
        market_cap: non_negative(fields.usd_market_cap).filter(|v| *v > 0.0),
        source: PriceSourceKind::CoinGecko,
        resolved_via,
    })
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn price_by_address(
        &self,
        chain: Chain,
        address: &str,
    ) -> Result<Option<PriceQuote>, SourceError> {
        Ok(self.token_price(chain, address).await?)
    }

    async fn price_by_symbol(&self, symbol: &str) -> Result<Option<PriceQuote>, SourceError> {
        let Some(coin_id) = self.search_coin_id(symbol).await? else {
            tracing::debug!(symbol, "No CoinGecko coin matches symbol");
            return Ok(None);
        };
        Ok(self.coin_price(&coin_id).await?)
    }
}
