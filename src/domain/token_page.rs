//! Token page view model
//!
//! Everything the detail page renders in one serializable value. Optional
//! metrics stay `None` when their upstream failed; only a missing primary
//! price produces a [`Notice`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::market::{PriceQuote, StockQuote};
use super::page_params::TokenPageParams;
use super::token_list::TokenInfo;
use super::tokenized_stock::TokenizedStock;

/// User-visible notification attached to a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notice {
    /// No upstream returned a price for the token
    PriceUnavailable { message: String },
}

/// Where a liquidity metric came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricOrigin {
    Query,
    Pools,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPageView {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub chain_id: Option<u64>,
    pub address: Option<String>,
    pub metadata: Option<TokenInfo>,
    pub price: Option<PriceQuote>,
    pub price_change_24h: Option<f64>,
    pub volume_24h: Option<f64>,
    pub volume_origin: Option<MetricOrigin>,
    pub tvl: Option<f64>,
    pub tvl_origin: Option<MetricOrigin>,
    pub market_cap: Option<f64>,
    pub tokenized_stock: Option<TokenizedStock>,
    pub stock: Option<StockQuote>,
    pub chart_symbol: Option<String>,
    pub notices: Vec<Notice>,
    pub fetched_at: DateTime<Utc>,
}

impl TokenPageView {
    /// Start a view from the request parameters alone
    pub fn from_params(params: &TokenPageParams) -> Self {
        Self {
            symbol: params.symbol.clone(),
            name: params.name.clone(),
            chain_id: params.chain_id,
            address: params.address.clone(),
            metadata: None,
            price: None,
            price_change_24h: params.price_change_24h,
            volume_24h: params.volume,
            volume_origin: params.volume.map(|_| MetricOrigin::Query),
            tvl: params.tvl,
            tvl_origin: params.tvl.map(|_| MetricOrigin::Query),
            market_cap: None,
            tokenized_stock: None,
            stock: None,
            chart_symbol: None,
            notices: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    /// Fill identity fields from a token-list entry without overriding the query
    pub fn apply_metadata(&mut self, token: TokenInfo) {
        if self.name.is_none() {
            self.name = Some(token.name.clone());
        }
        if self.chain_id.is_none() {
            self.chain_id = Some(token.chain_id);
        }
        if self.address.is_none() {
            self.address = Some(token.address.clone());
        }
        self.metadata = Some(token);
    }

    /// Apply a price quote; query-supplied 24h change wins over upstream
    pub fn apply_price(&mut self, quote: PriceQuote) {
        if self.price_change_24h.is_none() {
            self.price_change_24h = quote.price_change_24h;
        }
        if self.volume_24h.is_none() {
            if let Some(volume) = quote.volume_24h {
                self.volume_24h = Some(volume);
            }
        }
        self.market_cap = quote.market_cap;
        self.price = Some(quote);
    }

    pub fn needs_pool_stats(&self) -> bool {
        self.tvl_origin != Some(MetricOrigin::Query) || self.volume_origin != Some(MetricOrigin::Query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::Chain;
    use crate::domain::market::{PriceSourceKind, Resolution};

    fn quote() -> PriceQuote {
        PriceQuote {
            price_usd: 150.0,
            price_change_24h: Some(3.2),
            volume_24h: Some(1_000_000.0),
            market_cap: Some(70_000_000_000.0),
            source: PriceSourceKind::CoinGecko,
            resolved_via: Resolution::Address {
                chain: Chain::Solana,
                address: "So11111111111111111111111111111111111111112".to_string(),
            },
        }
    }

    #[test]
    fn test_query_values_take_precedence() {
        let params = TokenPageParams {
            symbol: Some("SOL".to_string()),
            volume: Some(42.0),
            price_change_24h: Some(-1.0),
            ..Default::default()
        };
        let mut view = TokenPageView::from_params(&params);
        view.apply_price(quote());

        assert_eq!(view.volume_24h, Some(42.0));
        assert_eq!(view.volume_origin, Some(MetricOrigin::Query));
        assert_eq!(view.price_change_24h, Some(-1.0));
        assert_eq!(view.market_cap, Some(70_000_000_000.0));
        assert!(view.price.is_some());
    }

    #[test]
    fn test_upstream_fills_missing_values() {
        let mut view = TokenPageView::from_params(&TokenPageParams::default());
        view.apply_price(quote());
        assert_eq!(view.volume_24h, Some(1_000_000.0));
        assert_eq!(view.volume_origin, None);
        assert_eq!(view.price_change_24h, Some(3.2));
        assert!(view.needs_pool_stats());
    }

    #[test]
    fn test_metadata_does_not_override_query() {
        let params = TokenPageParams {
            name: Some("Custom".to_string()),
            ..Default::default()
        };
        let mut view = TokenPageView::from_params(&params);
        view.apply_metadata(TokenInfo {
            chain_id: 1,
            address: "0xabc".to_string(),
            symbol: "ABC".to_string(),
            name: "Listed".to_string(),
            decimals: 18,
            logo_uri: None,
            tags: vec![],
        });
        assert_eq!(view.name.as_deref(), Some("Custom"));
        assert_eq!(view.chain_id, Some(1));
        assert_eq!(view.address.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_pool_stats_not_needed_when_query_has_both() {
        let params = TokenPageParams {
            tvl: Some(10.0),
            volume: Some(5.0),
            ..Default::default()
        };
        let view = TokenPageView::from_params(&params);
        assert!(!view.needs_pool_stats());
    }
}
