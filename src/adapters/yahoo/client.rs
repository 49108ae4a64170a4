//! Yahoo Finance chart API client
//!
//! Quotes come from `/v8/finance/chart/{ticker}?interval=1d&range=1d`, whose
//! `meta` block carries the regular-market price and the previous close.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::adapters::cache::SharedCache;
use crate::domain::market::{non_negative, percent_change};
use crate::domain::StockQuote;
use crate::ports::{SourceError, StockQuoteSource};

/// Yahoo rejects requests without a browser-like user agent
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum YahooError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid ticker: {0:?}")]
    InvalidTicker(String),

    #[error("Ticker not found: {0}")]
    NotFound(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, try again later")]
    RateLimited,

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },
}

impl From<YahooError> for SourceError {
    fn from(e: YahooError) -> Self {
        match e {
            YahooError::HttpError(e) => SourceError::Http(e.to_string()),
            YahooError::InvalidTicker(t) => SourceError::Parse(format!("invalid ticker {:?}", t)),
            YahooError::NotFound(t) => SourceError::NotFound(t),
            YahooError::ParseError(msg) => SourceError::Parse(msg),
            YahooError::RateLimited => SourceError::RateLimited,
            YahooError::ApiError { status, message } => SourceError::Status { status, message },
        }
    }
}

#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            api_url: "https://query1.finance.yahoo.com".to_string(),
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: Option<String>,
    currency: Option<String>,
    exchange_name: Option<String>,
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_volume: Option<f64>,
}

/// Tickers are letters, digits, `.`, `-`, `^` and `=` (e.g. `BRK.B`, `^GSPC`)
pub fn is_valid_ticker(ticker: &str) -> bool {
    !ticker.is_empty()
        && ticker.len() <= 16
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
}

#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    config: YahooConfig,
    http: Client,
    cache: SharedCache<Value>,
}

impl YahooFinanceClient {
    pub fn new(config: YahooConfig, cache: SharedCache<Value>) -> Result<Self, YahooError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { config, http, cache })
    }

    pub async fn quote(&self, ticker: &str) -> Result<StockQuote, YahooError> {
        let ticker = ticker.trim().to_ascii_uppercase();
        if !is_valid_ticker(&ticker) {
            return Err(YahooError::InvalidTicker(ticker));
        }

        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.config.api_url, ticker
        );
        let key = format!("yahoo:{}", url);
        let body = self
            .cache
            .get_or_try_insert_with(&key, self.config.cache_ttl, || self.execute_request(&url, &ticker))
            .await?;

        parse_chart(&ticker, body)
    }

    async fn execute_request(&self, url: &str, ticker: &str) -> Result<Value, YahooError> {
        tracing::debug!(url, "Yahoo Finance request");
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(ticker, "Yahoo Finance rate limited (429)");
            return Err(YahooError::RateLimited);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(YahooError::NotFound(ticker.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(YahooError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| YahooError::ParseError(e.to_string()))
    }
}

fn parse_chart(ticker: &str, body: Value) -> Result<StockQuote, YahooError> {
    let envelope: ChartEnvelope = serde_json::from_value(body)
        .map_err(|e| YahooError::ParseError(format!("Failed to parse chart: {}", e)))?;

    if let Some(err) = envelope.chart.error {
        let code = err.code.unwrap_or_default();
        if code.eq_ignore_ascii_case("Not Found") {
            return Err(YahooError::NotFound(ticker.to_string()));
        }
        return Err(YahooError::ParseError(format!(
            "{}: {}",
            code,
            err.description.unwrap_or_default()
        )));
    }

    let meta = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .map(|r| r.meta)
        .ok_or_else(|| YahooError::NotFound(ticker.to_string()))?;

    let price = non_negative(meta.regular_market_price)
        .ok_or_else(|| YahooError::ParseError(format!("No market price for {}", ticker)))?;
    let previous_close = non_negative(meta.previous_close.or(meta.chart_previous_close));

    Ok(StockQuote {
        ticker: meta.symbol.unwrap_or_else(|| ticker.to_string()),
        price,
        previous_close,
        price_change_percent: percent_change(price, previous_close),
        currency: meta.currency,
        exchange: meta.exchange_name,
        day_high: non_negative(meta.regular_market_day_high),
        day_low: non_negative(meta.regular_market_day_low),
        volume: non_negative(meta.regular_market_volume),
    })
}

#[async_trait]
impl StockQuoteSource for YahooFinanceClient {
    async fn get_quote(&self, ticker: &str) -> Result<StockQuote, SourceError> {
        Ok(self.quote(ticker).await?)
    }
}
