//! Tokenized stock recognition
//!
//! Tokenized equities are issued under the underlying ticker with a marker:
//! a trailing `x` (`AAPLx`, `TSLAx`) or a leading `b` (`bNVDA`). Only tickers in
//! the table below are recognised by symbol; anything else needs the
//! `tokenized-stock` tag on its token-list entry.

use serde::Serialize;

use super::token_list::TokenInfo;

/// Exchange an equity is primarily listed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Exchange {
    Nasdaq,
    Nyse,
    NyseArca,
}

impl Exchange {
    /// Prefix used by the charting widget
    pub fn chart_prefix(&self) -> &'static str {
        match self {
            Exchange::Nasdaq => "NASDAQ",
            Exchange::Nyse => "NYSE",
            Exchange::NyseArca => "AMEX",
        }
    }
}

/// An equity with a tokenized counterpart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenizedStock {
    /// Underlying equity ticker, e.g. `AAPL`
    pub ticker: String,
    pub exchange: Exchange,
}

const KNOWN_EQUITIES: &[(&str, Exchange)] = &[
    ("AAPL", Exchange::Nasdaq),
    ("ABBV", Exchange::Nyse),
    ("ABT", Exchange::Nyse),
    ("ACN", Exchange::Nyse),
    ("AMBR", Exchange::Nyse),
    ("AMZN", Exchange::Nasdaq),
    ("AVGO", Exchange::Nasdaq),
    ("AZN", Exchange::Nasdaq),
    ("BAC", Exchange::Nyse),
    ("BRK.B", Exchange::Nyse),
    ("CMCSA", Exchange::Nasdaq),
    ("COIN", Exchange::Nasdaq),
    ("CRCL", Exchange::Nyse),
    ("CRM", Exchange::Nyse),
    ("CSCO", Exchange::Nasdaq),
    ("CVX", Exchange::Nyse),
    ("DHR", Exchange::Nyse),
    ("GLD", Exchange::NyseArca),
    ("GME", Exchange::Nyse),
    ("GOOGL", Exchange::Nasdaq),
    ("GS", Exchange::Nyse),
    ("HD", Exchange::Nyse),
    ("HOOD", Exchange::Nasdaq),
    ("IBM", Exchange::Nyse),
    ("INTC", Exchange::Nasdaq),
    ("JNJ", Exchange::Nyse),
    ("JPM", Exchange::Nyse),
    ("KO", Exchange::Nyse),
    ("LLY", Exchange::Nyse),
    ("MA", Exchange::Nyse),
    ("MCD", Exchange::Nyse),
    ("MDT", Exchange::Nyse),
    ("META", Exchange::Nasdaq),
    ("MRK", Exchange::Nyse),
    ("MRVL", Exchange::Nasdaq),
    ("MSFT", Exchange::Nasdaq),
    ("MSTR", Exchange::Nasdaq),
    ("NFLX", Exchange::Nasdaq),
    ("NVDA", Exchange::Nasdaq),
    ("NVO", Exchange::Nyse),
    ("ORCL", Exchange::Nyse),
    ("PEP", Exchange::Nasdaq),
    ("PFE", Exchange::Nyse),
    ("PG", Exchange::Nyse),
    ("PLTR", Exchange::Nasdaq),
    ("PM", Exchange::Nyse),
    ("QQQ", Exchange::Nasdaq),
    ("SPY", Exchange::NyseArca),
    ("TMO", Exchange::Nyse),
    ("TSLA", Exchange::Nasdaq),
    ("UNH", Exchange::Nyse),
    ("V", Exchange::Nyse),
    ("WMT", Exchange::Nyse),
    ("XOM", Exchange::Nyse),
];

fn lookup_equity(ticker: &str) -> Option<TokenizedStock> {
    KNOWN_EQUITIES
        .iter()
        .find(|(t, _)| t.eq_ignore_ascii_case(ticker))
        .map(|(t, exchange)| TokenizedStock {
            ticker: t.to_string(),
            exchange: *exchange,
        })
}

/// Recognise a tokenized stock from its token symbol
pub fn from_symbol(symbol: &str) -> Option<TokenizedStock> {
    let symbol = symbol.trim();

    if let Some(base) = symbol.strip_suffix('x') {
        if let Some(stock) = lookup_equity(base) {
            return Some(stock);
        }
    }

    if let Some(base) = symbol.strip_prefix('b') {
        if let Some(stock) = lookup_equity(base) {
            return Some(stock);
        }
    }

    None
}

/// Recognise a tokenized stock from the symbol or the token-list entry
///
/// Tagged entries outside the table default to a Nasdaq listing under the
/// symbol with its marker removed.
pub fn detect(symbol: &str, token: Option<&TokenInfo>) -> Option<TokenizedStock> {
    if let Some(stock) = from_symbol(symbol) {
        return Some(stock);
    }

    let token = token.filter(|t| t.is_tokenized_stock())?;
    let raw = token.symbol.trim();
    let base = raw
        .strip_suffix('x')
        .or_else(|| raw.strip_prefix('b'))
        .unwrap_or(raw);

    if base.is_empty() {
        return None;
    }

    Some(lookup_equity(base).unwrap_or_else(|| TokenizedStock {
        ticker: base.to_ascii_uppercase(),
        exchange: Exchange::Nasdaq,
    }))
}
