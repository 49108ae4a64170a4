//! Market data values shown on a token page

use serde::{Deserialize, Serialize};

use super::chain::Chain;

/// Which upstream produced a price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSourceKind {
    CoinGecko,
    Jupiter,
}

/// How the price was located
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Resolution {
    /// Contract address on the requested chain
    Address { chain: Chain, address: String },
    /// CoinGecko coin id found through symbol search
    Symbol { coin_id: String },
    /// Contract address found on a chain other than the requested one
    AlternateChain { chain: Chain, address: String },
    /// Solana mint priced through Jupiter
    SolanaMint { mint: String },
}

/// Spot price with the optional 24h metrics the upstream returned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub price_usd: f64,
    pub price_change_24h: Option<f64>,
    pub volume_24h: Option<f64>,
    pub market_cap: Option<f64>,
    pub source: PriceSourceKind,
    pub resolved_via: Resolution,
}

/// Equity quote for a tokenized stock's underlying ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    pub ticker: String,
    pub price: f64,
    pub previous_close: Option<f64>,
    pub price_change_percent: Option<f64>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub volume: Option<f64>,
}

/// Percent change from `previous` to `current`, `None` when `previous` is not positive
pub fn percent_change(current: f64, previous: Option<f64>) -> Option<f64> {
    let previous = previous.filter(|p| *p > 0.0 && p.is_finite())?;
    if !current.is_finite() {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

/// Liquidity aggregated over a token's DEX pools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub tvl_usd: f64,
    pub volume_24h_usd: f64,
    pub pool_count: usize,
}

/// Token data returned by the batch Solana endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaTokenData {
    pub address: String,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub decimals: Option<u8>,
    #[serde(rename = "logoURI")]
    pub logo_uri: Option<String>,
    pub price_usd: Option<f64>,
}

impl SolanaTokenData {
    pub fn empty(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            symbol: None,
            name: None,
            decimals: None,
            logo_uri: None,
            price_usd: None,
        }
    }
}

/// Keep a metric only if it is finite and non-negative
pub fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_percent_change() {
        assert_relative_eq!(percent_change(110.0, Some(100.0)).unwrap(), 10.0);
        assert_relative_eq!(percent_change(95.0, Some(100.0)).unwrap(), -5.0);
        assert!(percent_change(95.0, Some(0.0)).is_none());
        assert!(percent_change(95.0, None).is_none());
        assert!(percent_change(f64::NAN, Some(10.0)).is_none());
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative(Some(1.0)), Some(1.0));
        assert_eq!(non_negative(Some(0.0)), Some(0.0));
        assert_eq!(non_negative(Some(-1.0)), None);
        assert_eq!(non_negative(Some(f64::INFINITY)), None);
        assert_eq!(non_negative(None), None);
    }

    #[test]
    fn test_resolution_serializes_tagged() {
        let via = Resolution::AlternateChain {
            chain: Chain::Arbitrum,
            address: "0xabc".to_string(),
        };
        let json = serde_json::to_value(&via).unwrap();
        assert_eq!(json["kind"], "alternateChain");
        assert_eq!(json["address"], "0xabc");

        let symbol = serde_json::to_value(Resolution::Symbol { coin_id: "solana".to_string() }).unwrap();
        assert_eq!(symbol["coinId"], "solana");
    }
}
