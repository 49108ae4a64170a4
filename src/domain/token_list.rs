//! Token List Types and Validation
//!
//! Token lists follow the common `{ name, tokens: [...] }` JSON layout. Payloads
//! are validated field by field before deserialization so a malformed list is
//! rejected as a whole, with an error that points at the offending entry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

use super::chain::normalize_address;

/// Tag marking a token as a tokenized equity
pub const TOKENIZED_STOCK_TAG: &str = "tokenized-stock";

/// Why a token list payload was rejected
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("token list must be a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` has wrong type, expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("token[{index}]: missing field `{field}`")]
    TokenMissingField { index: usize, field: &'static str },

    #[error("token[{index}]: field `{field}` has wrong type, expected {expected}")]
    TokenWrongType {
        index: usize,
        field: &'static str,
        expected: &'static str,
    },

    #[error("token[{index}]: decimals {value} out of range 0..=255")]
    DecimalsOutOfRange { index: usize, value: u64 },
}

/// A single token entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenInfo {
    #[serde(rename = "chainId")]
    pub chain_id: u64,
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl TokenInfo {
    pub fn is_tokenized_stock(&self) -> bool {
        self.tags.iter().any(|t| t == TOKENIZED_STOCK_TAG)
    }
}

/// A validated token list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenList {
    pub name: String,
    pub tokens: Vec<TokenInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl TokenList {
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

/// Validate a raw payload and convert it into a [`TokenList`]
pub fn validate_token_list(payload: &Value) -> Result<TokenList, ValidationError> {
    let obj = payload.as_object().ok_or(ValidationError::NotAnObject)?;

    let name = match obj.get("name") {
        None => return Err(ValidationError::MissingField("name")),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: "name",
                expected: "string",
            })
        }
    };

    let raw_tokens = match obj.get("tokens") {
        None => return Err(ValidationError::MissingField("tokens")),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: "tokens",
                expected: "array",
            })
        }
    };

    let tokens = raw_tokens
        .iter()
        .enumerate()
        .map(|(index, item)| validate_token(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TokenList {
        name,
        tokens,
        timestamp: optional_string(obj.get("timestamp")),
        logo_uri: optional_string(obj.get("logoURI")),
        keywords: string_array(obj.get("keywords")).unwrap_or_default(),
    })
}

fn validate_token(index: usize, item: &Value) -> Result<TokenInfo, ValidationError> {
    let obj = item.as_object().ok_or(ValidationError::TokenWrongType {
        index,
        field: "token",
        expected: "object",
    })?;

    let chain_id = required_u64(obj, index, "chainId")?;
    let address = required_str(obj, index, "address")?;
    let symbol = required_str(obj, index, "symbol")?;
    let name = required_str(obj, index, "name")?;
    let decimals = required_u64(obj, index, "decimals")?;
    let decimals = u8::try_from(decimals)
        .map_err(|_| ValidationError::DecimalsOutOfRange { index, value: decimals })?;

    let logo_uri = match obj.get("logoURI") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(ValidationError::TokenWrongType {
                index,
                field: "logoURI",
                expected: "string",
            })
        }
    };

    let tags = match obj.get("tags") {
        None | Some(Value::Null) => Vec::new(),
        other => string_array(other).ok_or(ValidationError::TokenWrongType {
            index,
            field: "tags",
            expected: "array of strings",
        })?,
    };

    Ok(TokenInfo {
        chain_id,
        address,
        symbol,
        name,
        decimals,
        logo_uri,
        tags,
    })
}

fn required_str(
    obj: &serde_json::Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<String, ValidationError> {
    match obj.get(field) {
        None => Err(ValidationError::TokenMissingField { index, field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::TokenWrongType {
            index,
            field,
            expected: "string",
        }),
    }
}

fn required_u64(
    obj: &serde_json::Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<u64, ValidationError> {
    match obj.get(field) {
        None => Err(ValidationError::TokenMissingField { index, field }),
        Some(v) => v.as_u64().ok_or(ValidationError::TokenWrongType {
            index,
            field,
            expected: "non-negative integer",
        }),
    }
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn string_array(value: Option<&Value>) -> Option<Vec<String>> {
    value?
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// Where a loaded list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListOrigin {
    Primary,
    Fallback,
    Static,
}

/// A token list together with its origin
#[derive(Debug, Clone, Serialize)]
pub struct LoadedList {
    /// Configured source name
    pub source: String,
    pub origin: ListOrigin,
    pub list: TokenList,
}

/// Merged lookup over every loaded list
///
/// Lists earlier in the input win when two lists carry the same
/// `(chainId, address)` pair.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: Vec<TokenInfo>,
    list_names: Vec<String>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lists<'a, I>(lists: I) -> Self
    where
        I: IntoIterator<Item = &'a TokenList>,
    {
        let mut seen = HashSet::new();
        let mut tokens = Vec::new();
        let mut list_names = Vec::new();

        for list in lists {
            list_names.push(list.name.clone());
            for token in &list.tokens {
                let key = (token.chain_id, normalize_address(token.chain_id, &token.address));
                if seen.insert(key) {
                    tokens.push(token.clone());
                }
            }
        }

        Self { tokens, list_names }
    }

    /// Find a token by symbol (case-insensitive), preferring `chain_id` when given
    pub fn find_by_symbol(&self, symbol: &str, chain_id: Option<u64>) -> Option<&TokenInfo> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return None;
        }
        let mut matches = self
            .tokens
            .iter()
            .filter(|t| t.symbol.eq_ignore_ascii_case(symbol));

        match chain_id {
            Some(id) => {
                let candidates: Vec<&TokenInfo> = matches.collect();
                candidates
                    .iter()
                    .find(|t| t.chain_id == id)
                    .or_else(|| candidates.first())
                    .copied()
            }
            None => matches.next(),
        }
    }

    pub fn find_by_address(&self, chain_id: u64, address: &str) -> Option<&TokenInfo> {
        let wanted = normalize_address(chain_id, address);
        self.tokens
            .iter()
            .find(|t| t.chain_id == chain_id && normalize_address(t.chain_id, &t.address) == wanted)
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn list_names(&self) -> &[String] {
        &self.list_names
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "name": "Test List",
            "timestamp": "2025-01-01T00:00:00Z",
            "keywords": ["test"],
            "tokens": [
                {
                    "chainId": 1,
                    "address": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
                    "symbol": "USDC",
                    "name": "USD Coin",
                    "decimals": 6,
                    "logoURI": "https://example.com/usdc.png"
                },
                {
                    "chainId": 101,
                    "address": "So11111111111111111111111111111111111111112",
                    "symbol": "SOL",
                    "name": "Wrapped SOL",
                    "decimals": 9
                }
            ]
        })
    }

    #[test]
    fn test_valid_list_accepted_and_counted() {
        let list = validate_token_list(&valid_payload()).unwrap();
        assert_eq!(list.name, "Test List");
        assert_eq!(list.token_count(), 2);
        assert_eq!(list.tokens[0].logo_uri.as_deref(), Some("https://example.com/usdc.png"));
        assert_eq!(list.tokens[1].logo_uri, None);
        assert_eq!(list.keywords, vec!["test".to_string()]);
    }

    #[test]
    fn test_empty_token_array_is_valid() {
        let list = validate_token_list(&json!({ "name": "Empty", "tokens": [] })).unwrap();
        assert_eq!(list.token_count(), 0);
    }

    #[test]
    fn test_rejects_non_object() {
        assert_eq!(
            validate_token_list(&json!([1, 2, 3])),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn test_rejects_missing_name() {
        let payload = json!({ "tokens": [] });
        assert_eq!(
            validate_token_list(&payload),
            Err(ValidationError::MissingField("name"))
        );
    }

    #[test]
    fn test_rejects_tokens_not_array() {
        let payload = json!({ "name": "Bad", "tokens": {} });
        assert!(matches!(
            validate_token_list(&payload),
            Err(ValidationError::WrongType { field: "tokens", .. })
        ));
    }

    #[test]
    fn test_rejects_token_missing_field() {
        let mut payload = valid_payload();
        payload["tokens"][1].as_object_mut().unwrap().remove("symbol");
        assert_eq!(
            validate_token_list(&payload),
            Err(ValidationError::TokenMissingField { index: 1, field: "symbol" })
        );
    }

    #[test]
    fn test_rejects_wrong_types() {
        let mut payload = valid_payload();
        payload["tokens"][0]["chainId"] = json!("1");
        assert!(matches!(
            validate_token_list(&payload),
            Err(ValidationError::TokenWrongType { index: 0, field: "chainId", .. })
        ));

        let mut payload = valid_payload();
        payload["tokens"][0]["decimals"] = json!(6.5);
        assert!(matches!(
            validate_token_list(&payload),
            Err(ValidationError::TokenWrongType { index: 0, field: "decimals", .. })
        ));

        let mut payload = valid_payload();
        payload["tokens"][0]["logoURI"] = json!(42);
        assert!(matches!(
            validate_token_list(&payload),
            Err(ValidationError::TokenWrongType { index: 0, field: "logoURI", .. })
        ));
    }

    #[test]
    fn test_rejects_decimals_out_of_range() {
        let mut payload = valid_payload();
        payload["tokens"][0]["decimals"] = json!(300);
        assert_eq!(
            validate_token_list(&payload),
            Err(ValidationError::DecimalsOutOfRange { index: 0, value: 300 })
        );
    }

    #[test]
    fn test_registry_deduplicates_and_prefers_chain() {
        let first = validate_token_list(&valid_payload()).unwrap();
        let second = validate_token_list(&json!({
            "name": "Second",
            "tokens": [
                {
                    "chainId": 1,
                    "address": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
                    "symbol": "USDC",
                    "name": "Duplicate USDC",
                    "decimals": 6
                },
                {
                    "chainId": 8453,
                    "address": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
                    "symbol": "USDC",
                    "name": "USD Coin (Base)",
                    "decimals": 6
                }
            ]
        }))
        .unwrap();

        let registry = TokenRegistry::from_lists([&first, &second]);
        assert_eq!(registry.token_count(), 3);
        assert_eq!(registry.list_names(), &["Test List".to_string(), "Second".to_string()]);

        let usdc = registry.find_by_symbol("usdc", None).unwrap();
        assert_eq!(usdc.name, "USD Coin");

        let base_usdc = registry.find_by_symbol("USDC", Some(8453)).unwrap();
        assert_eq!(base_usdc.name, "USD Coin (Base)");

        // Unknown chain falls back to any match
        let any = registry.find_by_symbol("USDC", Some(56)).unwrap();
        assert_eq!(any.chain_id, 1);

        let by_addr = registry
            .find_by_address(1, "0xA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48")
            .unwrap();
        assert_eq!(by_addr.symbol, "USDC");
        assert!(registry.find_by_symbol("", None).is_none());
    }
}
