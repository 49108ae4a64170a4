//! Chart widget symbol derivation
//!
//! The embedded chart takes an `EXCHANGE:PAIR` symbol. Tokenized stocks chart
//! their underlying equity, stablecoins chart against USD on Coinbase and
//! everything else charts against USDT on the configured exchange.

use super::tokenized_stock::TokenizedStock;

pub const DEFAULT_CRYPTO_EXCHANGE: &str = "BINANCE";
const STABLECOIN_EXCHANGE: &str = "COINBASE";

const STABLECOINS: &[&str] = &["USDC", "USDT", "DAI", "PYUSD", "USDE", "FDUSD", "TUSD", "USDS"];

const WRAPPED: &[(&str, &str)] = &[
    ("WETH", "ETH"),
    ("WBTC", "BTC"),
    ("CBBTC", "BTC"),
    ("WSOL", "SOL"),
    ("WBNB", "BNB"),
    ("WMATIC", "POL"),
    ("WPOL", "POL"),
    ("WAVAX", "AVAX"),
];

/// Strip the wrapped-native marker from a symbol (`WETH` -> `ETH`)
pub fn unwrap_symbol(symbol: &str) -> String {
    let upper = symbol.trim().to_ascii_uppercase();
    WRAPPED
        .iter()
        .find(|(wrapped, _)| *wrapped == upper)
        .map(|(_, native)| native.to_string())
        .unwrap_or(upper)
}

pub fn is_stablecoin(symbol: &str) -> bool {
    let upper = symbol.trim().to_ascii_uppercase();
    STABLECOINS.contains(&upper.as_str())
}

/// Derive the chart symbol for a token, `None` when there is nothing to chart
pub fn derive_chart_symbol(
    symbol: &str,
    stock: Option<&TokenizedStock>,
    crypto_exchange: &str,
) -> Option<String> {
    if let Some(stock) = stock {
        return Some(format!("{}:{}", stock.exchange.chart_prefix(), stock.ticker));
    }

    let base = unwrap_symbol(symbol);
    if base.is_empty() {
        return None;
    }

    if is_stablecoin(&base) {
        return Some(format!("{}:{}USD", STABLECOIN_EXCHANGE, base));
    }

    Some(format!("{}:{}USDT", crypto_exchange, base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tokenized_stock::{from_symbol, Exchange};

    #[test]
    fn test_crypto_symbol() {
        assert_eq!(
            derive_chart_symbol("sol", None, DEFAULT_CRYPTO_EXCHANGE).as_deref(),
            Some("BINANCE:SOLUSDT")
        );
        assert_eq!(
            derive_chart_symbol("JUP", None, "BYBIT").as_deref(),
            Some("BYBIT:JUPUSDT")
        );
    }

    #[test]
    fn test_wrapped_symbols_unwrapped() {
        assert_eq!(
            derive_chart_symbol("WETH", None, DEFAULT_CRYPTO_EXCHANGE).as_deref(),
            Some("BINANCE:ETHUSDT")
        );
        assert_eq!(
            derive_chart_symbol("cbBTC", None, DEFAULT_CRYPTO_EXCHANGE).as_deref(),
            Some("BINANCE:BTCUSDT")
        );
    }

    #[test]
    fn test_stablecoin_symbol() {
        assert_eq!(
            derive_chart_symbol("USDT", None, DEFAULT_CRYPTO_EXCHANGE).as_deref(),
            Some("COINBASE:USDTUSD")
        );
    }

    #[test]
    fn test_tokenized_stock_symbol() {
        let stock = from_symbol("TSLAx").unwrap();
        assert_eq!(
            derive_chart_symbol("TSLAx", Some(&stock), DEFAULT_CRYPTO_EXCHANGE).as_deref(),
            Some("NASDAQ:TSLA")
        );

        let nyse = TokenizedStock {
            ticker: "JPM".to_string(),
            exchange: Exchange::Nyse,
        };
        assert_eq!(
            derive_chart_symbol("JPMx", Some(&nyse), DEFAULT_CRYPTO_EXCHANGE).as_deref(),
            Some("NYSE:JPM")
        );
    }

    #[test]
    fn test_empty_symbol() {
        assert!(derive_chart_symbol("  ", None, DEFAULT_CRYPTO_EXCHANGE).is_none());
    }
}
