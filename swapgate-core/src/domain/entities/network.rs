//! Network entity for the swap core

use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    ARBITRUM_CHAIN_ID, BASE_CHAIN_ID, ETHEREUM_CHAIN_ID, OPTIMISM_CHAIN_ID, POLYGON_CHAIN_ID,
};

/// Chains on which swaps are allowed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Network {
    Ethereum,
    Optimism,
    Polygon,
    Base,
    Arbitrum,
}

impl Network {
    pub const ALL: [Network; 5] = [
        Network::Ethereum,
        Network::Optimism,
        Network::Polygon,
        Network::Base,
        Network::Arbitrum,
    ];

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Ethereum => ETHEREUM_CHAIN_ID,
            Network::Optimism => OPTIMISM_CHAIN_ID,
            Network::Polygon => POLYGON_CHAIN_ID,
            Network::Base => BASE_CHAIN_ID,
            Network::Arbitrum => ARBITRUM_CHAIN_ID,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Ethereum => "Ethereum",
            Network::Optimism => "Optimism",
            Network::Polygon => "Polygon",
            Network::Base => "Base",
            Network::Arbitrum => "Arbitrum One",
        }
    }

    pub fn native_currency(&self) -> &'static str {
        match self {
            Network::Polygon => "POL",
            _ => "ETH",
        }
    }

    pub fn block_explorer(&self) -> &'static str {
        match self {
            Network::Ethereum => "https://etherscan.io",
            Network::Optimism => "https://optimistic.etherscan.io",
            Network::Polygon => "https://polygonscan.com",
            Network::Base => "https://basescan.org",
            Network::Arbitrum => "https://arbiscan.io",
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Option<Network> {
        Self::ALL.iter().copied().find(|n| n.chain_id() == chain_id)
    }

    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.block_explorer(), tx_hash)
    }
}
