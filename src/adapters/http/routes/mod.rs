pub mod solana;
pub mod stock;
pub mod system;
pub mod token;

use axum::Router;
use std::sync::Arc;

use super::state::AppState;

/// Assemble the API router.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(stock::routes())
        .merge(solana::routes())
        .merge(token::routes())
        .merge(system::routes())
}
