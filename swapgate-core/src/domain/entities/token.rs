//! Token entity for the swap core

use serde::{Deserialize, Serialize};

use crate::shared::utils::{addresses_equal, is_native_address};

/// A fungible asset on one chain. Immutable once defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub chain_id: u64,
    pub is_native: bool,
    pub is_stablecoin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
}

impl Token {
    /// Same chain and same address, ignoring address case.
    pub fn same_asset(&self, other: &Token) -> bool {
        self.chain_id == other.chain_id && addresses_equal(&self.address, &other.address)
    }

    /// Native coins never need an ERC-20 allowance, whether flagged or
    /// addressed by the native pseudo-address.
    pub fn requires_allowance(&self) -> bool {
        !(self.is_native || is_native_address(&self.address))
    }
}
