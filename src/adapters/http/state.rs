use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::adapters::token_lists::{TokenListFetcher, TokenListSource};
use crate::application::{TokenPageService, UpstreamSources};
use crate::domain::{ListOrigin, LoadedList, TokenRegistry};
use crate::ports::{SolanaTokenSource, StockQuoteSource};

/// One loaded token list as reported by `/api/token-lists`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSummary {
    pub source: String,
    pub name: String,
    pub origin: ListOrigin,
    pub token_count: usize,
}

/// Shared application state, passed to all route handlers via `axum::extract::State`.
pub struct AppState {
    pub page: TokenPageService,
    pub stocks: Arc<dyn StockQuoteSource>,
    pub solana: Arc<dyn SolanaTokenSource>,
    lists: RwLock<Vec<LoadedList>>,
}

impl AppState {
    pub fn new(sources: UpstreamSources, chart_exchange: impl Into<String>) -> Arc<Self> {
        let registry = Arc::new(RwLock::new(TokenRegistry::new()));
        let page = TokenPageService::new(sources.clone(), registry).with_chart_exchange(chart_exchange);

        Arc::new(Self {
            page,
            stocks: sources.stocks,
            solana: sources.solana,
            lists: RwLock::new(Vec::new()),
        })
    }

    /// Replace the registry with freshly loaded lists
    ///
    /// A source that fell back to the static list keeps its previously
    /// installed live list, if it had one.
    pub async fn install_lists(&self, loaded: &[LoadedList]) {
        let mut lists = self.lists.write().await;

        let merged: Vec<LoadedList> = loaded
            .iter()
            .map(|fresh| {
                if fresh.origin != ListOrigin::Static {
                    return fresh.clone();
                }
                match lists
                    .iter()
                    .find(|prev| prev.source == fresh.source && prev.origin != ListOrigin::Static)
                {
                    Some(prev) => {
                        tracing::warn!(
                            source = %fresh.source,
                            "Token list refresh failed, keeping {:?} list",
                            prev.origin
                        );
                        prev.clone()
                    }
                    None => fresh.clone(),
                }
            })
            .collect();

        let registry = TokenRegistry::from_lists(merged.iter().map(|l| &l.list));
        tracing::info!(
            lists = merged.len(),
            tokens = registry.token_count(),
            "Token registry updated"
        );
        *self.page.registry().write().await = registry;
        *lists = merged;
    }

    pub async fn list_summaries(&self) -> Vec<ListSummary> {
        self.lists
            .read()
            .await
            .iter()
            .map(|l| ListSummary {
                source: l.source.clone(),
                name: l.list.name.clone(),
                origin: l.origin,
                token_count: l.list.token_count(),
            })
            .collect()
    }

    pub async fn registry_token_count(&self) -> usize {
        self.page.registry().read().await.token_count()
    }
}

/// Background task: reload every token list on a fixed interval.
pub fn spawn_token_list_refresh(
    state: Arc<AppState>,
    fetcher: TokenListFetcher,
    sources: Vec<TokenListSource>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // The initial load happens before the server starts
        let start = tokio::time::Instant::now() + every;
        let mut interval = tokio::time::interval_at(start, every);
        loop {
            interval.tick().await;
            tracing::debug!("Refreshing token lists");
            let loaded = fetcher.fetch_all(&sources).await;
            state.install_lists(&loaded).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validate_token_list;
    use crate::ports::mocks::{MockPoolSource, MockPriceSource, MockSolanaSource, MockStockSource};
    use serde_json::json;

    fn state() -> Arc<AppState> {
        AppState::new(
            UpstreamSources {
                prices: Arc::new(MockPriceSource::new()),
                solana: Arc::new(MockSolanaSource::new()),
                stocks: Arc::new(MockStockSource::new()),
                pools: Arc::new(MockPoolSource::new()),
            },
            "BINANCE",
        )
    }

    fn loaded(source: &str, origin: ListOrigin, name: &str, symbols: &[&str]) -> LoadedList {
        let tokens: Vec<_> = symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| {
                json!({
                    "chainId": 1,
                    "address": format!("0x{:040x}", i + 1),
                    "symbol": symbol,
                    "name": symbol,
                    "decimals": 18
                })
            })
            .collect();
        LoadedList {
            source: source.to_string(),
            origin,
            list: validate_token_list(&json!({ "name": name, "tokens": tokens })).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_static_refresh_keeps_live_list() {
        let state = state();
        state
            .install_lists(&[loaded("uniswap", ListOrigin::Primary, "Live", &["UNI"])])
            .await;

        // Outage: the refresh only produced the static list
        state
            .install_lists(&[loaded("uniswap", ListOrigin::Static, "Static", &["A", "B", "C"])])
            .await;

        let summaries = state.list_summaries().await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].name, "Live");
        assert_eq!(summaries[0].origin, ListOrigin::Primary);
        assert_eq!(state.registry_token_count().await, 1);
    }

    #[tokio::test]
    async fn test_static_used_when_nothing_live() {
        let state = state();
        state
            .install_lists(&[loaded("solana", ListOrigin::Static, "Static", &["SOL", "USDC"])])
            .await;
        state
            .install_lists(&[loaded("solana", ListOrigin::Static, "Static", &["SOL", "USDC"])])
            .await;

        let summaries = state.list_summaries().await;
        assert_eq!(summaries[0].origin, ListOrigin::Static);
        assert_eq!(state.registry_token_count().await, 2);
    }

    #[tokio::test]
    async fn test_live_refresh_replaces_previous() {
        let state = state();
        state
            .install_lists(&[
                loaded("a", ListOrigin::Primary, "A v1", &["AAA"]),
                loaded("b", ListOrigin::Static, "Static", &["S1", "S2"]),
            ])
            .await;
        state
            .install_lists(&[
                loaded("a", ListOrigin::Fallback, "A v2", &["AAA", "BBB"]),
                loaded("b", ListOrigin::Primary, "B live", &["X"]),
            ])
            .await;

        let summaries = state.list_summaries().await;
        assert_eq!(summaries[0].name, "A v2");
        assert_eq!(summaries[0].origin, ListOrigin::Fallback);
        assert_eq!(summaries[1].name, "B live");
    }
}
