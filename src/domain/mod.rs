//! Domain Layer - token page logic with no I/O
//!
//! - `chain`: supported chains and their upstream identifiers
//! - `token_list`: token-list types, payload validation and the merged registry
//! - `page_params`: detail-page query parameter parsing
//! - `tokenized_stock`: recognising tokenized equities
//! - `chart_symbol`: chart widget symbol derivation
//! - `market`: price, stock and pool values
//! - `token_page`: the assembled page view

pub mod chain;
pub mod token_list;
pub mod page_params;
pub mod tokenized_stock;
pub mod chart_symbol;
pub mod market;
pub mod token_page;

pub use chain::{is_solana_address, Chain};
pub use token_list::{
    validate_token_list, ListOrigin, LoadedList, TokenInfo, TokenList, TokenRegistry, ValidationError,
};
pub use page_params::TokenPageParams;
pub use tokenized_stock::{Exchange, TokenizedStock};
pub use chart_symbol::derive_chart_symbol;
pub use market::{PoolStats, PriceQuote, PriceSourceKind, Resolution, SolanaTokenData, StockQuote};
pub use token_page::{MetricOrigin, Notice, TokenPageView};
