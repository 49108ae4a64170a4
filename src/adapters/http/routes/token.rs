use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::state::AppState;
use crate::domain::{TokenPageParams, TokenPageView};

/// Build token page sub-router.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/token", get(token_page))
}

/// GET /api/token?symbol=&chainId=&...: Everything the token detail page renders.
async fn token_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<TokenPageView>, ApiError> {
    let params = TokenPageParams::from_query(&query);
    if params.symbol.is_none() && params.address.is_none() {
        return Err(ApiError::BadRequest(
            "symbol or address is required".to_string(),
        ));
    }

    Ok(Json(state.page.load(&params).await))
}
