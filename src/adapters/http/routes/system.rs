use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::adapters::http::state::{AppState, ListSummary};

/// Build system sub-router.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/token-lists", get(token_lists))
        .route("/health", get(health))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenListsResponse {
    lists: Vec<ListSummary>,
    /// Unique tokens after merging every list
    total_tokens: usize,
}

/// GET /api/token-lists: Loaded lists and where each came from.
async fn token_lists(State(state): State<Arc<AppState>>) -> Json<TokenListsResponse> {
    Json(TokenListsResponse {
        lists: state.list_summaries().await,
        total_tokens: state.registry_token_count().await,
    })
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
