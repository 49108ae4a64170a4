use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::state::AppState;
use crate::adapters::jupiter::MAX_IDS_PER_REQUEST;
use crate::domain::{is_solana_address, SolanaTokenData};

/// Most addresses accepted per batch request
pub const MAX_ADDRESSES: usize = MAX_IDS_PER_REQUEST;

/// Build Solana token sub-router.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/solana-tokens", post(solana_tokens))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaTokensRequest {
    #[serde(default)]
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolanaTokensResponse {
    pub tokens: Vec<SolanaTokenData>,
    /// Inputs that are not base58 32-byte keys
    pub invalid: Vec<String>,
}

/// Split inputs into unique valid mints and rejected strings, keeping order
fn partition_addresses(addresses: &[String]) -> (Vec<String>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut valid = Vec::new();
    let mut invalid = Vec::new();

    for raw in addresses {
        let address = raw.trim();
        if !is_solana_address(address) {
            invalid.push(raw.clone());
        } else if seen.insert(address.to_string()) {
            valid.push(address.to_string());
        }
    }

    (valid, invalid)
}

/// POST /api/solana-tokens: Batch metadata and prices for Solana mints.
async fn solana_tokens(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SolanaTokensRequest>, JsonRejection>,
) -> Result<Json<SolanaTokensResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if request.addresses.len() > MAX_ADDRESSES {
        return Err(ApiError::BadRequest(format!(
            "at most {} addresses per request, got {}",
            MAX_ADDRESSES,
            request.addresses.len()
        )));
    }

    let (valid, invalid) = partition_addresses(&request.addresses);
    if valid.is_empty() {
        return Ok(Json(SolanaTokensResponse {
            tokens: Vec::new(),
            invalid,
        }));
    }

    let tokens = state.solana.batch_token_data(&valid).await?;
    tracing::debug!(requested = valid.len(), invalid = invalid.len(), "Solana token batch");

    Ok(Json(SolanaTokensResponse { tokens, invalid }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOL: &str = "So11111111111111111111111111111111111111112";
    const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    #[test]
    fn test_partition_keeps_order_and_dedupes() {
        let input = vec![
            USDC.to_string(),
            "not-a-mint".to_string(),
            format!(" {} ", SOL),
            USDC.to_string(),
            "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".to_string(),
        ];
        let (valid, invalid) = partition_addresses(&input);

        assert_eq!(valid, vec![USDC.to_string(), SOL.to_string()]);
        assert_eq!(invalid.len(), 2);
        assert_eq!(invalid[0], "not-a-mint");
    }

    #[test]
    fn test_partition_empty() {
        let (valid, invalid) = partition_addresses(&[]);
        assert!(valid.is_empty());
        assert!(invalid.is_empty());
    }
}
