//! Token List Fetcher
//!
//! Each configured source has a primary URL and an optional fallback URL.
//! A URL gets three attempts. Failed attempt `n` waits `delays[n]` (1s, 2s,
//! 4s by default), the third included, so an exhausted URL costs 7s of
//! backoff before the switch to the fallback. When both URLs are exhausted
//! the static list bundled with the binary is used instead, so a source
//! always yields a list.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use futures::future::join_all;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{validate_token_list, ListOrigin, LoadedList, TokenList, ValidationError};

/// Attempts per URL
pub const MAX_ATTEMPTS: usize = 3;

/// Default backoff table, one delay per attempt
pub const DEFAULT_RETRY_DELAYS: [Duration; MAX_ATTEMPTS] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

const BUNDLED_LIST: &str = include_str!("../../../assets/static-tokenlist.json");

#[derive(Debug, Error)]
pub enum TokenListError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid token list: {0}")]
    Validation(#[from] ValidationError),

    #[error("Gave up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: usize,
        #[source]
        last: Box<TokenListError>,
    },

    #[error("Static token list unusable: {0}")]
    StaticList(String),
}

/// One configured token list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenListSource {
    pub name: String,
    pub primary_url: String,
    pub fallback_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TokenListFetcherConfig {
    pub retry_delays: [Duration; MAX_ATTEMPTS],
    /// Timeout applied to each individual download
    pub request_timeout: Duration,
    /// Replaces the bundled static list when set and readable
    pub static_list_path: Option<PathBuf>,
}

impl Default for TokenListFetcherConfig {
    fn default() -> Self {
        Self {
            retry_delays: DEFAULT_RETRY_DELAYS,
            request_timeout: Duration::from_secs(10),
            static_list_path: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenListFetcher {
    config: TokenListFetcherConfig,
    http: Client,
    static_list: TokenList,
}

impl TokenListFetcher {
    pub fn new(config: TokenListFetcherConfig) -> Result<Self, TokenListError> {
        let http = Client::builder().build()?;
        let static_list = load_static_list(config.static_list_path.as_deref())?;
        Ok(Self {
            config,
            http,
            static_list,
        })
    }

    pub fn static_list(&self) -> &TokenList {
        &self.static_list
    }

    /// Download and validate a single URL, no retries
    pub async fn fetch_once(&self, url: &str) -> Result<TokenList, TokenListError> {
        let response = self
            .http
            .get(url)
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TokenListError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TokenListError::InvalidJson(e.to_string()))?;

        Ok(validate_token_list(&body)?)
    }

    /// Download a URL with up to [`MAX_ATTEMPTS`] attempts
    pub async fn fetch_with_retry(&self, url: &str) -> Result<TokenList, TokenListError> {
        let list = retry_with_backoff(url, &self.config.retry_delays, || self.fetch_once(url)).await?;
        tracing::debug!(url, tokens = list.token_count(), "Token list fetched");
        Ok(list)
    }

    /// Primary, then fallback, then the static list
    pub async fn fetch_source(&self, source: &TokenListSource) -> LoadedList {
        match self.fetch_with_retry(&source.primary_url).await {
            Ok(list) => {
                return LoadedList {
                    source: source.name.clone(),
                    origin: ListOrigin::Primary,
                    list,
                }
            }
            Err(e) => tracing::warn!(source = %source.name, "Primary token list unavailable: {}", e),
        }

        if let Some(ref fallback_url) = source.fallback_url {
            match self.fetch_with_retry(fallback_url).await {
                Ok(list) => {
                    tracing::info!(source = %source.name, "Using fallback token list");
                    return LoadedList {
                        source: source.name.clone(),
                        origin: ListOrigin::Fallback,
                        list,
                    };
                }
                Err(e) => tracing::warn!(source = %source.name, "Fallback token list unavailable: {}", e),
            }
        }

        tracing::warn!(source = %source.name, "Using static token list");
        LoadedList {
            source: source.name.clone(),
            origin: ListOrigin::Static,
            list: self.static_list.clone(),
        }
    }

    /// Fetch every source concurrently, results in input order
    pub async fn fetch_all(&self, sources: &[TokenListSource]) -> Vec<LoadedList> {
        let loaded = join_all(sources.iter().map(|s| self.fetch_source(s))).await;
        let total: usize = loaded.iter().map(|l| l.list.token_count()).sum();
        tracing::info!(lists = loaded.len(), tokens = total, "Token lists loaded");
        loaded
    }
}

/// Run `attempt` once per entry of `delays`, sleeping that entry after each failure
async fn retry_with_backoff<T, F, Fut>(
    url: &str,
    delays: &[Duration],
    mut attempt: F,
) -> Result<T, TokenListError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TokenListError>>,
{
    let mut last_error = None;

    for (n, delay) in delays.iter().enumerate() {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(
                    "Token list fetch failed: {} (attempt {}/{}), backing off {:?}",
                    e,
                    n + 1,
                    delays.len(),
                    delay
                );
                last_error = Some(e);
                tokio::time::sleep(*delay).await;
            }
        }
    }

    Err(TokenListError::Exhausted {
        url: url.to_string(),
        attempts: delays.len(),
        last: Box::new(last_error.unwrap_or_else(|| {
            TokenListError::StaticList("no attempts were made".to_string())
        })),
    })
}

/// Load the static list from `path`, falling back to the bundled copy
pub fn load_static_list(path: Option<&Path>) -> Result<TokenList, TokenListError> {
    if let Some(path) = path {
        match read_list_file(path) {
            Ok(list) => return Ok(list),
            Err(e) => tracing::warn!(
                "Static token list at {} unusable ({}), using bundled list",
                path.display(),
                e
            ),
        }
    }

    let body: Value = serde_json::from_str(BUNDLED_LIST)
        .map_err(|e| TokenListError::StaticList(e.to_string()))?;
    validate_token_list(&body).map_err(|e| TokenListError::StaticList(e.to_string()))
}

fn read_list_file(path: &Path) -> Result<TokenList, TokenListError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| TokenListError::StaticList(e.to_string()))?;
    let body: Value =
        serde_json::from_str(&content).map_err(|e| TokenListError::InvalidJson(e.to_string()))?;
    Ok(validate_token_list(&body)?)
}
