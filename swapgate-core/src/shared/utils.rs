//! Utility functions for the swap core
//!
//! This module contains common utility functions used throughout the swap core.

use crate::shared::constants::NATIVE_TOKEN_ADDRESS;
use crate::shared::error::SwapError;

/// Validate Ethereum address format
pub fn validate_ethereum_address(address: &str) -> Result<(), SwapError> {
    if !address.starts_with("0x") {
        return Err(SwapError::validation(format!("Address must start with 0x: {address}")));
    }

    if address.len() != 42 {
        return Err(SwapError::validation(format!("Address must be 42 characters long: {address}")));
    }

    // Check if all characters after 0x are valid hex
    if !address[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SwapError::validation(format!("Address contains invalid hex characters: {address}")));
    }

    Ok(())
}

/// Case-insensitive address comparison (checksummed vs lowercase forms match)
pub fn addresses_equal(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// True when the address is the native-coin pseudo-address
pub fn is_native_address(address: &str) -> bool {
    addresses_equal(address, NATIVE_TOKEN_ADDRESS)
}

/// Convert bytes to hex string
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Mask a secret for display, keeping the first and last four characters
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return "(not set)".to_string();
    }
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
