//! Application Layer - use cases built on the ports
//!
//! - `token_page`: assembles the token detail page from every upstream

pub mod token_page;

pub use token_page::{TokenPageService, UpstreamSources};
