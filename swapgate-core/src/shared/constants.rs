//! Constants for the swap core
//!
//! This module contains all constants used throughout the swap core.

/// Pseudo-address the aggregator uses for a chain's native coin.
pub const NATIVE_TOKEN_ADDRESS: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

// Supported chains (fixed allow-list, never auto-discovered)
pub const ETHEREUM_CHAIN_ID: u64 = 1;
pub const OPTIMISM_CHAIN_ID: u64 = 10;
pub const POLYGON_CHAIN_ID: u64 = 137;
pub const BASE_CHAIN_ID: u64 = 8453;
pub const ARBITRUM_CHAIN_ID: u64 = 42161;

pub const SUPPORTED_CHAIN_IDS: &[u64] = &[
    ETHEREUM_CHAIN_ID,
    OPTIMISM_CHAIN_ID,
    POLYGON_CHAIN_ID,
    BASE_CHAIN_ID,
    ARBITRUM_CHAIN_ID,
];

// Slippage constants
pub const MIN_SLIPPAGE_PERCENT: f64 = 0.0;
pub const MAX_SLIPPAGE_PERCENT: f64 = 5.0;
pub const DEFAULT_SLIPPAGE_PERCENT: f64 = 0.5;
pub const SLIPPAGE_PRESETS: &[f64] = &[0.1, 0.5, 1.0];
pub const BPS_PER_PERCENT: f64 = 100.0;
pub const BPS_DENOMINATOR: u32 = 10_000;

// Amount display constants
pub const DEFAULT_DISPLAY_DECIMALS: u32 = 6;
pub const MIN_DISPLAY_DECIMALS: u32 = 2;
pub const NATIVE_DECIMALS: u32 = 18;
pub const MAX_TOKEN_DECIMALS: u32 = 77;

// Upstream aggregator defaults
pub const DEFAULT_AGGREGATOR_URL: &str = "https://api.0x.org";
pub const PRICE_PATH: &str = "/swap/allowance-holder/price";
pub const QUOTE_PATH: &str = "/swap/allowance-holder/quote";
pub const DEFAULT_API_KEY_HEADER: &str = "0x-api-key";
pub const DEFAULT_VERSION_HEADER: &str = "0x-version";
pub const DEFAULT_API_VERSION: &str = "v2";
pub const DEFAULT_AGGREGATOR_TIMEOUT_MS: u64 = 10_000;

// Orchestrator timing constants (milliseconds)
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_SUCCESS_DISPLAY_MS: u64 = 3_000;
pub const DEFAULT_ERROR_CLEAR_MS: u64 = 5_000;
pub const DEFAULT_RECEIPT_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 2_000;
pub const DEFAULT_QUOTE_TTL_MS: u64 = 30_000;

/// `approve(address,uint256)` selector
pub const ERC20_APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];
