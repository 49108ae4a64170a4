use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapters::http::state::AppState;
use crate::adapters::yahoo::is_valid_ticker;

/// Build stock sub-router.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/stock-price-change", get(stock_price_change))
}

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub ticker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPriceChange {
    pub price_change_percent: Option<f64>,
    pub ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /api/stock-price-change?ticker=AAPL: Daily percent change for an equity.
async fn stock_price_change(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StockQuery>,
) -> (StatusCode, Json<StockPriceChange>) {
    let ticker = query
        .ticker
        .map(|t| t.trim().to_ascii_uppercase())
        .filter(|t| !t.is_empty());

    let Some(ticker) = ticker else {
        return (
            StatusCode::BAD_REQUEST,
            Json(StockPriceChange {
                price_change_percent: None,
                ticker: None,
                error: Some("ticker is required".to_string()),
            }),
        );
    };

    // Rejected locally, no upstream call is made
    if !is_valid_ticker(&ticker) {
        return (
            StatusCode::BAD_REQUEST,
            Json(StockPriceChange {
                price_change_percent: None,
                ticker: Some(ticker.clone()),
                error: Some(format!("invalid ticker \"{}\"", ticker)),
            }),
        );
    }

    match state.stocks.get_quote(&ticker).await {
        Ok(quote) => (
            StatusCode::OK,
            Json(StockPriceChange {
                price_change_percent: quote.price_change_percent,
                ticker: Some(ticker),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(%ticker, "Stock quote failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(StockPriceChange {
                    price_change_percent: None,
                    ticker: Some(ticker),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
