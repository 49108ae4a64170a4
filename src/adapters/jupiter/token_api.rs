//! Jupiter Token and Price Client
//!
//! Fetches Solana token metadata from Jupiter's Token API V2 and USD prices from
//! Price API V3.
//!
//! # Endpoints Used
//! - Token API V2: `https://lite-api.jup.ag/tokens/v2/search?query=<mint,mint>`
//! - Price API V3: `https://lite-api.jup.ag/price/v3?ids=<mint,mint>`
//!
//! Both accept comma-separated mints; Price API V3 caps a request at 50 ids.

use std::collections::HashMap;
use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PriceQuote, PriceSourceKind, Resolution, SolanaTokenData};
use crate::ports::{SolanaTokenSource, SourceError};

/// Most mints Price API V3 accepts per request
pub const MAX_IDS_PER_REQUEST: usize = 50;

/// Errors that can occur when fetching token data
#[derive(Debug, Error)]
pub enum JupiterTokenError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Token not found: {0}")]
    TokenNotFound(String),

    #[error("Rate limited, try again later")]
    RateLimited,

    #[error("API error: {0}")]
    ApiError(String),
}

impl From<JupiterTokenError> for SourceError {
    fn from(e: JupiterTokenError) -> Self {
        match e {
            JupiterTokenError::HttpError(e) => SourceError::Http(e.to_string()),
            JupiterTokenError::ParseError(msg) => SourceError::Parse(msg),
            JupiterTokenError::TokenNotFound(mint) => SourceError::NotFound(mint),
            JupiterTokenError::RateLimited => SourceError::RateLimited,
            JupiterTokenError::ApiError(msg) => SourceError::Http(msg),
        }
    }
}

/// Configuration for the Jupiter client
#[derive(Debug, Clone)]
pub struct JupiterTokenConfig {
    /// Base URL for Token API V2
    pub token_api_url: String,
    /// Base URL for Price API V3
    pub price_api_url: String,
    /// Optional API key for higher rate limits
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Number of attempts per request
    pub max_retries: u32,
    /// Base delay for exponential backoff (milliseconds)
    pub retry_base_delay_ms: u64,
}

impl Default for JupiterTokenConfig {
    fn default() -> Self {
        Self {
            // lite-api.jup.ag is the free tier; api.jup.ag needs a key
            token_api_url: "https://lite-api.jup.ag/tokens/v2".to_string(),
            price_api_url: "https://lite-api.jup.ag/price/v3".to_string(),
            api_key: None,
            timeout: Duration::from_secs(15),
            max_retries: 3,
            retry_base_delay_ms: 500,
        }
    }
}

impl JupiterTokenConfig {
    /// Create config with API key (uses api.jup.ag for higher limits)
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            token_api_url: "https://api.jup.ag/tokens/v2".to_string(),
            price_api_url: "https://api.jup.ag/price/v3".to_string(),
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }
}

/// Token information from Token API V2
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JupiterToken {
    /// Token mint address
    #[serde(alias = "address")]
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(alias = "logoURI")]
    pub icon: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub usd_price: Option<f64>,
}

/// One mint's entry in a Price API V3 response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceV3Entry {
    usd_price: f64,
    price_change_24h: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct JupiterTokenClient {
    config: JupiterTokenConfig,
    http: Client,
}

impl JupiterTokenClient {
    pub fn new() -> Result<Self, JupiterTokenError> {
        Self::with_config(JupiterTokenConfig::default())
    }

    pub fn with_config(config: JupiterTokenConfig) -> Result<Self, JupiterTokenError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { config, http })
    }

    /// Token metadata for up to 100 mints
    pub async fn search_tokens(&self, mints: &[String]) -> Result<Vec<JupiterToken>, JupiterTokenError> {
        if mints.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/search?query={}", self.config.token_api_url, mints.join(","));
        let response = self.execute_request(&url).await?;

        response.json().await.map_err(|e| {
            JupiterTokenError::ParseError(format!("Failed to parse search results: {}", e))
        })
    }

    /// USD prices keyed by mint; mints without a price are absent
    pub async fn get_prices(
        &self,
        mints: &[String],
    ) -> Result<HashMap<String, (f64, Option<f64>)>, JupiterTokenError> {
        let mut prices = HashMap::new();

        for chunk in mints.chunks(MAX_IDS_PER_REQUEST) {
            let url = format!("{}?ids={}", self.config.price_api_url, chunk.join(","));
            let response = self.execute_request(&url).await?;

            let entries: HashMap<String, Option<PriceV3Entry>> = response.json().await.map_err(|e| {
                JupiterTokenError::ParseError(format!("Failed to parse prices response: {}", e))
            })?;

            for (mint, entry) in entries {
                if let Some(entry) = entry.filter(|e| e.usd_price.is_finite() && e.usd_price >= 0.0) {
                    prices.insert(mint, (entry.usd_price, entry.price_change_24h));
                }
            }
        }

        Ok(prices)
    }

    /// Execute request with retry logic
    async fn execute_request(&self, url: &str) -> Result<reqwest::Response, JupiterTokenError> {
        let mut last_error = None;

        for attempt in 0..self.config.max_retries {
            let mut req = self.http.get(url);

            if let Some(ref api_key) = self.config.api_key {
                req = req.header("x-api-key", api_key);
            }

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    // Handle rate limiting with exponential backoff
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let backoff = Duration::from_millis(
                            self.config.retry_base_delay_ms * 2u64.pow(attempt + 1),
                        );
                        tracing::warn!(
                            "Rate limited (429), backing off for {:?} (attempt {}/{})",
                            backoff,
                            attempt + 1,
                            self.config.max_retries
                        );
                        last_error = Some(JupiterTokenError::RateLimited);
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    // Retry on server errors (5xx)
                    if status.is_server_error() {
                        let backoff = Duration::from_millis(
                            self.config.retry_base_delay_ms * (attempt as u64 + 1),
                        );
                        last_error = Some(JupiterTokenError::ApiError(format!(
                            "Server error: {}",
                            status
                        )));
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    if status == StatusCode::NOT_FOUND {
                        return Err(JupiterTokenError::TokenNotFound(url.to_string()));
                    }

                    if status.is_client_error() {
                        let error_text = response.text().await.unwrap_or_default();
                        return Err(JupiterTokenError::ApiError(format!(
                            "API error {}: {}",
                            status, error_text
                        )));
                    }

                    return Ok(response);
                }
                Err(e) => {
                    last_error = Some(JupiterTokenError::HttpError(e));
                    let backoff = Duration::from_millis(
                        self.config.retry_base_delay_ms * (attempt as u64 + 1),
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            JupiterTokenError::ApiError("Max retries exceeded".into())
        }))
    }
}

#[async_trait]
impl SolanaTokenSource for JupiterTokenClient {
    async fn price_by_mint(&self, mint: &str) -> Result<Option<PriceQuote>, SourceError> {
        let prices = self.get_prices(&[mint.to_string()]).await?;
        Ok(prices.get(mint).map(|(price_usd, change)| PriceQuote {
            price_usd: *price_usd,
            price_change_24h: *change,
            volume_24h: None,
            market_cap: None,
            source: PriceSourceKind::Jupiter,
            resolved_via: Resolution::SolanaMint {
                mint: mint.to_string(),
            },
        }))
    }

    async fn batch_token_data(&self, mints: &[String]) -> Result<Vec<SolanaTokenData>, SourceError> {
        let tokens = self.search_tokens(mints).await?;
        let prices = match self.get_prices(mints).await {
            Ok(prices) => prices,
            Err(e) => {
                // Metadata without prices
                tracing::warn!("Jupiter price lookup failed: {}", e);
                HashMap::new()
            }
        };

        let by_mint: HashMap<&str, &JupiterToken> =
            tokens.iter().map(|t| (t.id.as_str(), t)).collect();

        Ok(mints
            .iter()
            .map(|mint| {
                let price_usd = prices
                    .get(mint)
                    .map(|(p, _)| *p)
                    .or_else(|| by_mint.get(mint.as_str()).and_then(|t| t.usd_price));
                match by_mint.get(mint.as_str()) {
                    Some(token) => SolanaTokenData {
                        address: mint.clone(),
                        symbol: Some(token.symbol.clone()),
                        name: Some(token.name.clone()),
                        decimals: Some(token.decimals),
                        logo_uri: token.icon.clone(),
                        price_usd,
                    },
                    None => SolanaTokenData {
                        price_usd,
                        ..SolanaTokenData::empty(mint.as_str())
                    },
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const SOL: &str = "So11111111111111111111111111111111111111112";
    const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    fn client_for(server: &Server) -> JupiterTokenClient {
        JupiterTokenClient::with_config(JupiterTokenConfig {
            token_api_url: format!("{}/tokens/v2", server.url()),
            price_api_url: format!("{}/price/v3", server.url()),
            retry_base_delay_ms: 1,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = JupiterTokenConfig::default();
        assert_eq!(config.token_api_url, "https://lite-api.jup.ag/tokens/v2");
        assert_eq!(config.price_api_url, "https://lite-api.jup.ag/price/v3");
        assert!(config.api_key.is_none());
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_config_with_api_key() {
        let config = JupiterTokenConfig::with_api_key("test-key");
        assert_eq!(config.token_api_url, "https://api.jup.ag/tokens/v2");
        assert_eq!(config.api_key, Some("test-key".to_string()));
    }

    #[test]
    fn test_token_accepts_v1_field_names() {
        let token: JupiterToken = serde_json::from_str(
            r#"{"address":"Mint1","name":"One","symbol":"ONE","decimals":6,"logoURI":"https://x/1.png","tags":["verified"]}"#,
        )
        .unwrap();
        assert_eq!(token.id, "Mint1");
        assert_eq!(token.icon.as_deref(), Some("https://x/1.png"));
        assert_eq!(token.tags, vec!["verified".to_string()]);
    }

    #[tokio::test]
    async fn test_batch_token_data_merges_metadata_and_prices() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/tokens/v2/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(format!(
                r#"[{{"id":"{}","name":"Wrapped SOL","symbol":"SOL","decimals":9,"icon":"https://x/sol.png","usdPrice":150.0}}]"#,
                SOL
            ))
            .create_async()
            .await;
        server
            .mock("GET", "/price/v3")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(format!(
                r#"{{"{}":{{"usdPrice":151.25,"blockId":1,"decimals":9,"priceChange24h":2.1}},"{}":null}}"#,
                SOL, USDC
            ))
            .create_async()
            .await;

        let client = client_for(&server);
        let data = client
            .batch_token_data(&[SOL.to_string(), USDC.to_string()])
            .await
            .unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data[0].symbol.as_deref(), Some("SOL"));
        assert_eq!(data[0].price_usd, Some(151.25));
        assert_eq!(data[0].logo_uri.as_deref(), Some("https://x/sol.png"));
        assert_eq!(data[1], SolanaTokenData::empty(USDC));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/price/v3")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.price_by_mint(SOL).await;
        assert!(matches!(result, Err(SourceError::Http(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_requests() {
        let server = Server::new_async().await;
        let client = client_for(&server);
        let data = client.batch_token_data(&[]).await.unwrap();
        assert!(data.is_empty());
    }
}
