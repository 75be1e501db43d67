//! The user's pending swap, as edited in the swap form.

use serde::{Deserialize, Serialize};

use super::token::Token;
use crate::shared::constants::DEFAULT_SLIPPAGE_PERCENT;
use crate::shared::error::SwapError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapIntent {
    pub from_token: Option<Token>,
    pub to_token: Option<Token>,
    pub human_amount: String,
    pub slippage_percent: f64,
}

impl Default for SwapIntent {
    fn default() -> Self {
        Self {
            from_token: None,
            to_token: None,
            human_amount: String::new(),
            slippage_percent: DEFAULT_SLIPPAGE_PERCENT,
        }
    }
}

impl SwapIntent {
    /// Checks the token pair against the active chain. Both tokens must be
    /// present, live on `chain_id`, and be different assets.
    pub fn validate_pair(&self, chain_id: u64) -> Result<(&Token, &Token), SwapError> {
        let (from, to) = match (&self.from_token, &self.to_token) {
            (Some(from), Some(to)) => (from, to),
            _ => return Err(SwapError::validation("Select both tokens")),
        };
        if from.chain_id != chain_id || to.chain_id != chain_id {
            return Err(SwapError::validation(format!(
                "Tokens must be on the connected chain {chain_id}"
            )));
        }
        if from.same_asset(to) {
            return Err(SwapError::IdenticalTokens);
        }
        Ok((from, to))
    }

    /// Swap the two sides of the pair in place.
    pub fn flip(&mut self) {
        std::mem::swap(&mut self.from_token, &mut self.to_token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(symbol: &str, address: &str, chain_id: u64) -> Token {
        Token {
            address: address.to_string(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            decimals: 18,
            chain_id,
            is_native: false,
            is_stablecoin: false,
            logo_uri: None,
        }
    }

    #[test]
    fn test_validate_pair() {
        let a = token("AAA", "0x00000000000000000000000000000000000000aa", 1);
        let a_upper = token("AAA", "0x00000000000000000000000000000000000000AA", 1);
        let b = token("BBB", "0x00000000000000000000000000000000000000bb", 1);

        let mut intent = SwapIntent {
            from_token: Some(a.clone()),
            to_token: Some(b.clone()),
            ..Default::default()
        };
        assert!(intent.validate_pair(1).is_ok());
        assert!(matches!(intent.validate_pair(10), Err(SwapError::Validation(_))));

        intent.to_token = Some(a_upper);
        assert_eq!(intent.validate_pair(1).unwrap_err(), SwapError::IdenticalTokens);

        intent.to_token = None;
        assert!(intent.validate_pair(1).is_err());
    }

    #[test]
    fn test_flip() {
        let a = token("AAA", "0x00000000000000000000000000000000000000aa", 1);
        let b = token("BBB", "0x00000000000000000000000000000000000000bb", 1);
        let mut intent = SwapIntent {
            from_token: Some(a.clone()),
            to_token: Some(b.clone()),
            ..Default::default()
        };
        intent.flip();
        assert_eq!(intent.from_token, Some(b));
        assert_eq!(intent.to_token, Some(a));
    }
}
