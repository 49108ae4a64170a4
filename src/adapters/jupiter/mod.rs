//! Jupiter Adapter
//!
//! Solana token metadata and USD prices. Implements
//! [`SolanaTokenSource`](crate::ports::SolanaTokenSource), backing the batch
//! Solana token endpoint and the last step of the price chain.

mod token_api;

pub use token_api::{
    JupiterToken, JupiterTokenClient, JupiterTokenConfig, JupiterTokenError, MAX_IDS_PER_REQUEST,
};
