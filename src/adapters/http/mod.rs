//! HTTP Adapter
//!
//! axum server exposing the token page, batch Solana token data, stock price
//! change and token-list summaries as JSON.

mod error;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::solana::{SolanaTokensRequest, SolanaTokensResponse, MAX_ADDRESSES};
pub use routes::stock::StockPriceChange;
pub use state::{spawn_token_list_refresh, AppState, ListSummary};

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Assemble the application router.
pub fn router(state: Arc<AppState>) -> Router {
    routes::api_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl+C
pub async fn serve(state: Arc<AppState>, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Token Pulse listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully stopping");
}
