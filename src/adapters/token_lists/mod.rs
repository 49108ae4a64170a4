//! Token List Adapter
//!
//! Downloads token lists with retry and primary/fallback selection, with a
//! static list as the last resort.

mod fetcher;

pub use fetcher::{
    load_static_list, TokenListError, TokenListFetcher, TokenListFetcherConfig, TokenListSource,
    DEFAULT_RETRY_DELAYS, MAX_ATTEMPTS,
};
