//! Token page query parameters
//!
//! The detail page is addressed with query parameters such as
//! `?symbol=SOL&chainId=101&tvl=1200000&volume=35000&priceChange24h=-2.4`.
//! Values arrive as strings and frequently contain `"null"`, `"undefined"` or
//! nothing at all, so every field is optional.

use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPageParams {
    /// Symbol as given, trimmed
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub chain_id: Option<u64>,
    pub address: Option<String>,
    /// Total value locked, never negative
    pub tvl: Option<f64>,
    /// 24h volume, never negative
    pub volume: Option<f64>,
    pub price_change_24h: Option<f64>,
}

impl TokenPageParams {
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let get = |key: &str| query.get(key).map(String::as_str);

        Self {
            symbol: parse_text(get("symbol")),
            name: parse_text(get("name")),
            chain_id: parse_text(get("chainId")).and_then(|s| s.parse().ok()),
            address: parse_text(get("address")),
            tvl: parse_non_negative(get("tvl")),
            volume: parse_non_negative(get("volume")),
            price_change_24h: parse_number(get("priceChange24h")),
        }
    }

    /// Upper-cased symbol for lookups
    pub fn lookup_symbol(&self) -> Option<String> {
        self.symbol.as_ref().map(|s| s.to_ascii_uppercase())
    }
}

fn parse_text(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || trimmed == "null" || trimmed == "undefined" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_number(raw: Option<&str>) -> Option<f64> {
    let text = parse_text(raw)?;
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_non_negative(raw: Option<&str>) -> Option<f64> {
    parse_number(raw).filter(|v| *v >= 0.0)
}
