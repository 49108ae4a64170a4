//! Token page orchestration
//!
//! Runs the detail-page pipeline for one request, sequentially:
//! metadata lookup, the price chain, the tokenized-stock quote, pool
//! statistics and finally the chart symbol. Only the price chain can add a
//! notice; the other upstreams degrade to `None`.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::chart_symbol::{derive_chart_symbol, DEFAULT_CRYPTO_EXCHANGE};
use crate::domain::{
    is_solana_address, tokenized_stock, Chain, MetricOrigin, Notice, PriceQuote, TokenInfo,
    TokenPageParams, TokenPageView, TokenRegistry,
};
use crate::ports::{PoolStatsSource, PriceSource, SolanaTokenSource, SourceError, StockQuoteSource};

/// Every upstream the page reads from
#[derive(Clone)]
pub struct UpstreamSources {
    pub prices: Arc<dyn PriceSource>,
    pub solana: Arc<dyn SolanaTokenSource>,
    pub stocks: Arc<dyn StockQuoteSource>,
    pub pools: Arc<dyn PoolStatsSource>,
}

#[derive(Clone)]
pub struct TokenPageService {
    sources: UpstreamSources,
    registry: Arc<RwLock<TokenRegistry>>,
    chart_exchange: String,
}

impl TokenPageService {
    pub fn new(sources: UpstreamSources, registry: Arc<RwLock<TokenRegistry>>) -> Self {
        Self {
            sources,
            registry,
            chart_exchange: DEFAULT_CRYPTO_EXCHANGE.to_string(),
        }
    }

    /// Exchange prefix used for crypto chart symbols
    pub fn with_chart_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.chart_exchange = exchange.into();
        self
    }

    pub fn registry(&self) -> &Arc<RwLock<TokenRegistry>> {
        &self.registry
    }

    pub async fn load(&self, params: &TokenPageParams) -> TokenPageView {
        let mut view = TokenPageView::from_params(params);

        if let Some(token) = self.lookup_metadata(params).await {
            tracing::debug!(symbol = %token.symbol, chain_id = token.chain_id, "Token metadata found");
            view.apply_metadata(token);
        }

        match self.resolve_price(&view).await {
            Some(quote) => view.apply_price(quote),
            None => {
                let label = display_label(&view);
                tracing::warn!(token = %label, "No price source returned a price");
                view.notices.push(Notice::PriceUnavailable {
                    message: format!("Unable to fetch price for {}", label),
                });
            }
        }

        let symbol = view
            .symbol
            .clone()
            .or_else(|| view.metadata.as_ref().map(|t| t.symbol.clone()))
            .unwrap_or_default();

        view.tokenized_stock = tokenized_stock::detect(&symbol, view.metadata.as_ref());
        if let Some(ref stock) = view.tokenized_stock {
            match self.sources.stocks.get_quote(&stock.ticker).await {
                Ok(quote) => view.stock = Some(quote),
                Err(e) => tracing::warn!(ticker = %stock.ticker, "Stock quote unavailable: {}", e),
            }
        }

        if view.needs_pool_stats() {
            self.apply_pool_stats(&mut view).await;
        }

        view.chart_symbol =
            derive_chart_symbol(&symbol, view.tokenized_stock.as_ref(), &self.chart_exchange);
        view
    }

    async fn lookup_metadata(&self, params: &TokenPageParams) -> Option<TokenInfo> {
        let registry = self.registry.read().await;

        if let (Some(chain_id), Some(address)) = (params.chain_id, params.address.as_deref()) {
            if let Some(token) = registry.find_by_address(chain_id, address) {
                return Some(token.clone());
            }
        }

        let symbol = params.lookup_symbol()?;
        registry.find_by_symbol(&symbol, params.chain_id).cloned()
    }

    /// Address on the requested chain, then symbol, then alternate chains, then Jupiter
    async fn resolve_price(&self, view: &TokenPageView) -> Option<PriceQuote> {
        let chain = view.chain_id.and_then(Chain::from_id);
        let address = view.address.as_deref().map(str::trim).filter(|a| !a.is_empty());
        let symbol = view
            .symbol
            .as_deref()
            .or_else(|| view.metadata.as_ref().map(|t| t.symbol.as_str()))
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty());

        if let (Some(chain), Some(address)) = (chain, address) {
            let attempt = self.sources.prices.price_by_address(chain, address);
            if let Some(quote) = try_source("address", attempt).await {
                return Some(quote);
            }
        }

        if let Some(ref symbol) = symbol {
            let attempt = self.sources.prices.price_by_symbol(symbol);
            if let Some(quote) = try_source("symbol", attempt).await {
                return Some(quote);
            }
        }

        if let Some(address) = address {
            let alternates: Vec<Chain> = match chain {
                Some(chain) => chain.alternates().collect(),
                None => Chain::ALL.to_vec(),
            };
            for alt in alternates.into_iter().filter(|c| c.accepts_address(address)) {
                let attempt = self.sources.prices.price_by_address(alt, address);
                if let Some(mut quote) = try_source(alt.coingecko_platform(), attempt).await {
                    quote.resolved_via = crate::domain::Resolution::AlternateChain {
                        chain: alt,
                        address: address.to_string(),
                    };
                    return Some(quote);
                }
            }

            if is_solana_address(address) {
                let attempt = self.sources.solana.price_by_mint(address);
                if let Some(quote) = try_source("jupiter", attempt).await {
                    return Some(quote);
                }
            }
        }

        None
    }

    async fn apply_pool_stats(&self, view: &mut TokenPageView) {
        let chain = view.chain_id.and_then(Chain::from_id);
        let (Some(chain), Some(address)) = (chain, view.address.clone()) else {
            return;
        };
        if !chain.accepts_address(address.trim()) {
            tracing::debug!(%address, "Address does not fit chain, skipping pool stats");
            return;
        }

        match self.sources.pools.get_pool_stats(chain, &address).await {
            Ok(stats) => {
                if view.tvl_origin != Some(MetricOrigin::Query) {
                    view.tvl = Some(stats.tvl_usd);
                    view.tvl_origin = Some(MetricOrigin::Pools);
                }
                if view.volume_24h.is_none() {
                    view.volume_24h = Some(stats.volume_24h_usd);
                    view.volume_origin = Some(MetricOrigin::Pools);
                }
            }
            Err(e) => tracing::warn!(%address, "Pool stats unavailable: {}", e),
        }
    }
}

/// Run one price attempt, logging and swallowing failures
async fn try_source<F>(step: &str, attempt: F) -> Option<PriceQuote>
where
    F: Future<Output = Result<Option<PriceQuote>, SourceError>>,
{
    match attempt.await {
        Ok(Some(quote)) => {
            tracing::debug!(step, price = quote.price_usd, "Price resolved");
            Some(quote)
        }
        Ok(None) => {
            tracing::debug!(step, "No price");
            None
        }
        Err(e) => {
            tracing::warn!(step, "Price lookup failed: {}", e);
            None
        }
    }
}

fn display_label(view: &TokenPageView) -> String {
    view.symbol
        .clone()
        .or_else(|| view.address.clone())
        .unwrap_or_else(|| "unknown token".to_string())
}
