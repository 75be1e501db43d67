//! Static per-chain token directory
//!
//! Loaded once on first use and never mutated. Unknown chains simply have no
//! tokens; lookups never fail with an error.

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::domain::entities::token::Token;
use crate::shared::constants::{
    ARBITRUM_CHAIN_ID, BASE_CHAIN_ID, ETHEREUM_CHAIN_ID, NATIVE_TOKEN_ADDRESS, OPTIMISM_CHAIN_ID,
    POLYGON_CHAIN_ID,
};
use crate::shared::utils::addresses_equal;

/// Curated (sell, buy) symbol pairs shown as shortcuts. Pairs whose symbols
/// do not exist on a chain are skipped for that chain.
pub const RECOMMENDED_PAIR_SYMBOLS: &[(&str, &str)] = &[
    ("ETH", "USDC"),
    ("ETH", "USDT"),
    ("WETH", "USDC"),
    ("USDC", "USDT"),
    ("ETH", "DAI"),
    ("WBTC", "ETH"),
    ("ETH", "ARB"),
    ("ETH", "OP"),
    ("POL", "USDC"),
    ("ETH", "cbETH"),
];

struct Spec {
    symbol: &'static str,
    name: &'static str,
    address: &'static str,
    decimals: u8,
    is_stablecoin: bool,
}

const fn erc20(symbol: &'static str, name: &'static str, address: &'static str, decimals: u8) -> Spec {
    Spec { symbol, name, address, decimals, is_stablecoin: false }
}

const fn stable(symbol: &'static str, name: &'static str, address: &'static str, decimals: u8) -> Spec {
    Spec { symbol, name, address, decimals, is_stablecoin: true }
}

const fn native(symbol: &'static str, name: &'static str) -> Spec {
    Spec { symbol, name, address: NATIVE_TOKEN_ADDRESS, decimals: 18, is_stablecoin: false }
}

fn build(chain_id: u64, specs: &[Spec]) -> Vec<Token> {
    specs
        .iter()
        .map(|s| Token {
            address: s.address.to_string(),
            symbol: s.symbol.to_string(),
            name: s.name.to_string(),
            decimals: s.decimals,
            chain_id,
            is_native: addresses_equal(s.address, NATIVE_TOKEN_ADDRESS),
            is_stablecoin: s.is_stablecoin,
            logo_uri: None,
        })
        .collect()
}

lazy_static! {
    static ref DIRECTORY: HashMap<u64, Vec<Token>> = {
        let mut m = HashMap::new();
        m.insert(ETHEREUM_CHAIN_ID, build(ETHEREUM_CHAIN_ID, &[
            native("ETH", "Ether"),
            erc20("WETH", "Wrapped Ether", "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", 18),
            stable("USDC", "USD Coin", "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 6),
            stable("USDT", "Tether USD", "0xdAC17F958D2ee523a2206206994597C13D831ec7", 6),
            stable("DAI", "Dai Stablecoin", "0x6B175474E89094C44Da98b954EedeAC495271d0F", 18),
            erc20("WBTC", "Wrapped BTC", "0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599", 8),
        ]));
        m.insert(OPTIMISM_CHAIN_ID, build(OPTIMISM_CHAIN_ID, &[
            native("ETH", "Ether"),
            erc20("WETH", "Wrapped Ether", "0x4200000000000000000000000000000000000006", 18),
            stable("USDC", "USD Coin", "0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85", 6),
            erc20("OP", "Optimism", "0x4200000000000000000000000000000000000042", 18),
        ]));
        m.insert(POLYGON_CHAIN_ID, build(POLYGON_CHAIN_ID, &[
            native("POL", "Polygon Ecosystem Token"),
            erc20("WPOL", "Wrapped POL", "0x0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270", 18),
            erc20("WETH", "Wrapped Ether", "0x7ceB23fD6bC0adD59E62ac25578270cFf1b9f619", 18),
            stable("USDC", "USD Coin", "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359", 6),
            stable("USDT", "Tether USD", "0xc2132D05D31c914a87C6611C10748AEb04B58e8F", 6),
        ]));
        m.insert(BASE_CHAIN_ID, build(BASE_CHAIN_ID, &[
            native("ETH", "Ether"),
            erc20("WETH", "Wrapped Ether", "0x4200000000000000000000000000000000000006", 18),
            stable("USDC", "USD Coin", "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913", 6),
            stable("DAI", "Dai Stablecoin", "0x50c5725949A6F0c72E6C4a641F24049A917DB0Cb", 18),
            erc20("cbETH", "Coinbase Wrapped Staked ETH", "0x2Ae3F1Ec7F1F5012CFEab0185bfc7aa3cf0DEc22", 18),
        ]));
        m.insert(ARBITRUM_CHAIN_ID, build(ARBITRUM_CHAIN_ID, &[
            native("ETH", "Ether"),
            erc20("WETH", "Wrapped Ether", "0x82aF49447D8a07e3bd95BD0d56f35241523fBab1", 18),
            stable("USDC", "USD Coin", "0xaf88d065e77c8cC2239327C5EDb3A432268e5831", 6),
            stable("USDT", "Tether USD", "0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9", 6),
            erc20("ARB", "Arbitrum", "0x912CE59144191C1204E64559FE8253a0e49E6548", 18),
        ]));
        m
    };
}

/// Tokens listed for `chain_id`, in display order. Empty for unknown chains.
pub fn tokens_for_chain(chain_id: u64) -> &'static [Token] {
    DIRECTORY.get(&chain_id).map(Vec::as_slice).unwrap_or(&[])
}

pub fn find_by_symbol(chain_id: u64, symbol: &str) -> Option<&'static Token> {
    tokens_for_chain(chain_id)
        .iter()
        .find(|t| t.symbol.eq_ignore_ascii_case(symbol.trim()))
}

pub fn find_by_address(chain_id: u64, address: &str) -> Option<&'static Token> {
    tokens_for_chain(chain_id)
        .iter()
        .find(|t| addresses_equal(&t.address, address))
}

pub fn is_supported(chain_id: u64, address: &str) -> bool {
    find_by_address(chain_id, address).is_some()
}

pub fn native_token(chain_id: u64) -> Option<&'static Token> {
    tokens_for_chain(chain_id).iter().find(|t| t.is_native)
}

/// Curated pairs resolvable on `chain_id`; unresolvable ones are dropped silently.
pub fn recommended_pairs(chain_id: u64) -> Vec<(Token, Token)> {
    RECOMMENDED_PAIR_SYMBOLS
        .iter()
        .filter_map(|(sell, buy)| {
            let sell = find_by_symbol(chain_id, sell)?;
            let buy = find_by_symbol(chain_id, buy)?;
            Some((sell.clone(), buy.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::SUPPORTED_CHAIN_IDS;
    use crate::shared::utils::validate_ethereum_address;

    #[test]
    fn test_every_supported_chain_has_tokens() {
        for chain_id in SUPPORTED_CHAIN_IDS {
            let tokens = tokens_for_chain(*chain_id);
            assert!(!tokens.is_empty(), "chain {chain_id} has no tokens");
            assert!(native_token(*chain_id).is_some());
            for token in tokens {
                assert_eq!(token.chain_id, *chain_id);
                assert!(validate_ethereum_address(&token.address).is_ok(), "{}", token.address);
            }
        }
    }

    #[test]
    fn test_unknown_chain_is_empty() {
        assert!(tokens_for_chain(999_999).is_empty());
        assert!(find_by_symbol(999_999, "ETH").is_none());
        assert!(recommended_pairs(999_999).is_empty());
    }

    #[test]
    fn test_lookups_are_case_insensitive() {
        let usdc = find_by_symbol(ETHEREUM_CHAIN_ID, "usdc").expect("usdc");
        assert_eq!(usdc.decimals, 6);
        assert!(usdc.is_stablecoin);

        let by_addr = find_by_address(ETHEREUM_CHAIN_ID, "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
        assert_eq!(by_addr, Some(usdc));
        assert!(is_supported(ETHEREUM_CHAIN_ID, "0xEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEE"));
        assert!(!is_supported(BASE_CHAIN_ID, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"));
    }

    #[test]
    fn test_symbol_is_exact_match() {
        assert!(find_by_symbol(ETHEREUM_CHAIN_ID, "US").is_none());
        assert!(find_by_symbol(BASE_CHAIN_ID, "CBETH").is_some());
    }

    #[test]
    fn test_native_flag() {
        let eth = native_token(ARBITRUM_CHAIN_ID).expect("eth");
        assert!(eth.is_native);
        assert!(!eth.requires_allowance());
        let pol = native_token(POLYGON_CHAIN_ID).expect("pol");
        assert_eq!(pol.symbol, "POL");
    }

    #[test]
    fn test_recommended_pairs_drop_unresolvable() {
        let pairs = recommended_pairs(OPTIMISM_CHAIN_ID);
        let symbols: Vec<(String, String)> = pairs
            .iter()
            .map(|(a, b)| (a.symbol.clone(), b.symbol.clone()))
            .collect();
        assert!(symbols.contains(&("ETH".to_string(), "USDC".to_string())));
        assert!(symbols.contains(&("ETH".to_string(), "OP".to_string())));
        assert!(!symbols.iter().any(|(_, b)| b == "ARB" || b == "USDT"));

        let polygon = recommended_pairs(POLYGON_CHAIN_ID);
        let symbols: Vec<(&str, &str)> = polygon
            .iter()
            .map(|(a, b)| (a.symbol.as_str(), b.symbol.as_str()))
            .collect();
        assert_eq!(symbols, vec![("WETH", "USDC"), ("USDC", "USDT"), ("POL", "USDC")]);
    }
}
