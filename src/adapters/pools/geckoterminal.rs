use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::adapters::cache::SharedCache;
use crate::domain::{Chain, PoolStats};
use crate::ports::{PoolStatsSource, SourceError};

#[derive(Debug, Error)]
pub enum PoolStatsError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Token has no pools: {0}")]
    NoPools(String),

    #[error("Address {address} is not valid on {network}")]
    InvalidAddress { network: String, address: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, try again later")]
    RateLimited,

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },
}

impl From<PoolStatsError> for SourceError {
    fn from(e: PoolStatsError) -> Self {
        match e {
            PoolStatsError::HttpError(e) => SourceError::Http(e.to_string()),
            PoolStatsError::NoPools(addr) => SourceError::NotFound(addr),
            e @ PoolStatsError::InvalidAddress { .. } => SourceError::Parse(e.to_string()),
            PoolStatsError::ParseError(msg) => SourceError::Parse(msg),
            PoolStatsError::RateLimited => SourceError::RateLimited,
            PoolStatsError::ApiError { status, message } => SourceError::Status { status, message },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoolStatsConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
}

impl Default for PoolStatsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.geckoterminal.com/api/v2".to_string(),
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PoolsResponse {
    #[serde(default)]
    data: Vec<PoolData>,
}

#[derive(Debug, Deserialize)]
struct PoolData {
    attributes: PoolAttributes,
}

#[derive(Debug, Deserialize)]
struct PoolAttributes {
    reserve_in_usd: Option<String>,
    volume_usd: Option<VolumeUsd>,
}

#[derive(Debug, Deserialize)]
struct VolumeUsd {
    h24: Option<String>,
}

fn parse_usd(raw: Option<&str>) -> Option<f64> {
    raw?.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Sum TVL and 24h volume over a pool listing
///
/// Pools whose reserve cannot be parsed are skipped entirely; a pool with a
/// valid reserve but no volume contributes zero volume.
pub fn aggregate_pools(body: Value) -> Result<PoolStats, PoolStatsError> {
    let response: PoolsResponse = serde_json::from_value(body)
        .map_err(|e| PoolStatsError::ParseError(format!("Failed to parse pools: {}", e)))?;

    let mut stats = PoolStats {
        tvl_usd: 0.0,
        volume_24h_usd: 0.0,
        pool_count: 0,
    };

    for pool in response.data {
        let Some(reserve) = parse_usd(pool.attributes.reserve_in_usd.as_deref()) else {
            continue;
        };
        let volume = pool
            .attributes
            .volume_usd
            .as_ref()
            .and_then(|v| parse_usd(v.h24.as_deref()))
            .unwrap_or(0.0);

        stats.tvl_usd += reserve;
        stats.volume_24h_usd += volume;
        stats.pool_count += 1;
    }

    Ok(stats)
}

#[derive(Debug, Clone)]
pub struct GeckoTerminalClient {
    config: PoolStatsConfig,
    http: Client,
    cache: SharedCache<Value>,
}

impl GeckoTerminalClient {
    pub fn new(config: PoolStatsConfig, cache: SharedCache<Value>) -> Result<Self, PoolStatsError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http, cache })
    }

    pub async fn pool_stats(&self, chain: Chain, address: &str) -> Result<PoolStats, PoolStatsError> {
        let address = address.trim();
        // Only hex or base58 characters reach the URL path
        if !chain.accepts_address(address) {
            return Err(PoolStatsError::InvalidAddress {
                network: chain.geckoterminal_network().to_string(),
                address: address.to_string(),
            });
        }

        let url = format!(
            "{}/networks/{}/tokens/{}/pools?page=1",
            self.config.api_url,
            chain.geckoterminal_network(),
            address
        );
        let key = format!("pools:{}", url);
        let body = self
            .cache
            .get_or_try_insert_with(&key, self.config.cache_ttl, || self.execute_request(&url))
            .await?;

        let stats = aggregate_pools(body)?;
        if stats.pool_count == 0 {
            return Err(PoolStatsError::NoPools(address.to_string()));
        }

        tracing::debug!(
            network = chain.geckoterminal_network(),
            address,
            pools = stats.pool_count,
            tvl = stats.tvl_usd,
            "Aggregated pool stats"
        );
        Ok(stats)
    }

    async fn execute_request(&self, url: &str) -> Result<Value, PoolStatsError> {
        let response = self
            .http
            .get(url)
            .header("accept", "application/json;version=20230302")
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("GeckoTerminal rate limited (429)");
            return Err(PoolStatsError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PoolStatsError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| PoolStatsError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl PoolStatsSource for GeckoTerminalClient {
    async fn get_pool_stats(&self, chain: Chain, address: &str) -> Result<PoolStats, SourceError> {
        Ok(self.pool_stats(chain, address).await?)
    }
}
