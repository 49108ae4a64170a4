//! Supported chains and their upstream identifiers
//!
//! Token lists carry numeric `chainId`s. CoinGecko and GeckoTerminal each name
//! the same chains differently, so the mapping lives here in one place.

use serde::{Deserialize, Serialize};

/// Chains the price chain knows how to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Optimism,
    Bsc,
    Polygon,
    Base,
    Arbitrum,
    Avalanche,
    Solana,
}

impl Chain {
    /// Solana mainnet-beta id as used by the Solana token list standard
    pub const SOLANA_CHAIN_ID: u64 = 101;

    /// Every supported chain, in the order alternates are tried
    pub const ALL: [Chain; 8] = [
        Chain::Ethereum,
        Chain::Solana,
        Chain::Base,
        Chain::Arbitrum,
        Chain::Polygon,
        Chain::Bsc,
        Chain::Optimism,
        Chain::Avalanche,
    ];

    pub fn from_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            1 => Some(Chain::Ethereum),
            10 => Some(Chain::Optimism),
            56 => Some(Chain::Bsc),
            137 => Some(Chain::Polygon),
            8453 => Some(Chain::Base),
            42161 => Some(Chain::Arbitrum),
            43114 => Some(Chain::Avalanche),
            Self::SOLANA_CHAIN_ID => Some(Chain::Solana),
            _ => None,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Chain::Ethereum => 1,
            Chain::Optimism => 10,
            Chain::Bsc => 56,
            Chain::Polygon => 137,
            Chain::Base => 8453,
            Chain::Arbitrum => 42161,
            Chain::Avalanche => 43114,
            Chain::Solana => Self::SOLANA_CHAIN_ID,
        }
    }

    /// CoinGecko asset platform id (`/simple/token_price/{platform}`)
    pub fn coingecko_platform(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Optimism => "optimistic-ethereum",
            Chain::Bsc => "binance-smart-chain",
            Chain::Polygon => "polygon-pos",
            Chain::Base => "base",
            Chain::Arbitrum => "arbitrum-one",
            Chain::Avalanche => "avalanche",
            Chain::Solana => "solana",
        }
    }

    /// GeckoTerminal network slug (`/networks/{network}/...`)
    pub fn geckoterminal_network(&self) -> &'static str {
        match self {
            Chain::Ethereum => "eth",
            Chain::Optimism => "optimism",
            Chain::Bsc => "bsc",
            Chain::Polygon => "polygon_pos",
            Chain::Base => "base",
            Chain::Arbitrum => "arbitrum",
            Chain::Avalanche => "avax",
            Chain::Solana => "solana",
        }
    }

    pub fn is_evm(&self) -> bool {
        !matches!(self, Chain::Solana)
    }

    /// Whether an address has the right shape for this chain
    pub fn accepts_address(&self, address: &str) -> bool {
        if self.is_evm() {
            address
                .strip_prefix("0x")
                .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
        } else {
            is_solana_address(address)
        }
    }

    /// All chains except `self`, in `ALL` order
    pub fn alternates(&self) -> impl Iterator<Item = Chain> + '_ {
        Self::ALL.iter().copied().filter(move |c| c != self)
    }

    /// Normalize an address for comparison (EVM addresses are case-insensitive)
    pub fn normalize_address(&self, address: &str) -> String {
        let trimmed = address.trim();
        if self.is_evm() {
            trimmed.to_ascii_lowercase()
        } else {
            trimmed.to_string()
        }
    }
}

/// Normalize an address when the chain id may be unknown
pub fn normalize_address(chain_id: u64, address: &str) -> String {
    match Chain::from_id(chain_id) {
        Some(chain) => chain.normalize_address(address),
        None => address.trim().to_ascii_lowercase(),
    }
}

/// Check whether a string is a base58 Solana address (32 bytes decoded)
pub fn is_solana_address(address: &str) -> bool {
    matches!(bs58::decode(address).into_vec(), Ok(bytes) if bytes.len() == 32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_round_trip() {
        for chain in Chain::ALL {
            assert_eq!(Chain::from_id(chain.id()), Some(chain));
        }
        assert_eq!(Chain::from_id(999_999), None);
    }

    #[test]
    fn test_alternates_exclude_self() {
        let alternates: Vec<Chain> = Chain::Base.alternates().collect();
        assert_eq!(alternates.len(), Chain::ALL.len() - 1);
        assert!(!alternates.contains(&Chain::Base));
        assert_eq!(alternates[0], Chain::Ethereum);
    }

    #[test]
    fn test_accepts_address() {
        assert!(Chain::Ethereum.accepts_address("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"));
        assert!(!Chain::Ethereum.accepts_address("0xabc"));
        assert!(!Chain::Base.accepts_address("0xZZb86991c6218b36c1d19D4a2e9Eb0cE3606eB48"));
        assert!(!Chain::Base.accepts_address("So11111111111111111111111111111111111111112"));
        assert!(Chain::Solana.accepts_address("So11111111111111111111111111111111111111112"));
        assert!(!Chain::Solana.accepts_address("So111/../pools"));
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            Chain::Ethereum.normalize_address(" 0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48 "),
            "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"
        );
        assert_eq!(
            Chain::Solana.normalize_address("So11111111111111111111111111111111111111112"),
            "So11111111111111111111111111111111111111112"
        );
    }

    #[test]
    fn test_is_solana_address() {
        assert!(is_solana_address("So11111111111111111111111111111111111111112"));
        assert!(is_solana_address("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"));
        assert!(!is_solana_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"));
        assert!(!is_solana_address("short"));
        assert!(!is_solana_address(""));
    }
}
