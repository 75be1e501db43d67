//! Core configuration
//!
//! Read from the process environment (and `.env` when present). Every key is
//! prefixed with `SWAPGATE_`; unset keys fall back to the defaults in
//! `shared::constants`.

use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::core::aggregator::AggregatorConfig;
use crate::core::orchestrator::OrchestratorConfig;
use crate::shared::error::{SwapError, SwapResult};
use crate::shared::utils::mask_secret;

pub const ENV_PREFIX: &str = "SWAPGATE_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwapCoreConfig {
    pub aggregator: AggregatorConfig,
    pub orchestrator: OrchestratorConfig,
    /// JSON-RPC endpoint used to poll approval receipts.
    pub rpc_url: Option<String>,
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> SwapResult<T> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SwapError::config(format!("{ENV_PREFIX}{key} is not a valid number: '{raw}'"))),
        None => Ok(default),
    }
}

impl SwapCoreConfig {
    /// Load from the environment, reading `.env` first if present.
    pub fn from_env() -> SwapResult<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Load from an arbitrary key source. Keys are passed without the prefix.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SwapResult<Self> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let aggregator_defaults = AggregatorConfig::default();
        let orchestrator_defaults = OrchestratorConfig::default();

        let aggregator = AggregatorConfig {
            base_url: lookup("AGGREGATOR_URL").unwrap_or(aggregator_defaults.base_url),
            api_key: lookup("API_KEY").unwrap_or_default(),
            api_key_header: lookup("API_KEY_HEADER").unwrap_or(aggregator_defaults.api_key_header),
            version_header: lookup("VERSION_HEADER").unwrap_or(aggregator_defaults.version_header),
            api_version: lookup("API_VERSION").unwrap_or(aggregator_defaults.api_version),
            timeout_ms: parse_or(&lookup, "AGGREGATOR_TIMEOUT_MS", aggregator_defaults.timeout_ms)?,
        };

        let orchestrator = OrchestratorConfig {
            debounce_ms: parse_or(&lookup, "DEBOUNCE_MS", orchestrator_defaults.debounce_ms)?,
            success_display_ms: parse_or(&lookup, "SUCCESS_DISPLAY_MS", orchestrator_defaults.success_display_ms)?,
            error_clear_ms: parse_or(&lookup, "ERROR_CLEAR_MS", orchestrator_defaults.error_clear_ms)?,
            receipt_timeout_ms: parse_or(&lookup, "RECEIPT_TIMEOUT_MS", orchestrator_defaults.receipt_timeout_ms)?,
            receipt_poll_ms: parse_or(&lookup, "RECEIPT_POLL_MS", orchestrator_defaults.receipt_poll_ms)?,
            quote_ttl_ms: parse_or(&lookup, "QUOTE_TTL_MS", orchestrator_defaults.quote_ttl_ms)?,
        };

        let config = Self { aggregator, orchestrator, rpc_url: lookup("RPC_URL") };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SwapResult<()> {
        self.aggregator.validate()?;
        self.orchestrator.validate()?;
        if let Some(url) = &self.rpc_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(SwapError::config(format!("RPC URL must be http(s): {url}")));
            }
        }
        if self.aggregator.api_key.is_empty() {
            log::warn!("{ENV_PREFIX}API_KEY is not set; the aggregator will likely reject requests");
        }
        Ok(())
    }

    /// Human-readable summary with the API key masked.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Aggregator URL", self.aggregator.base_url.clone()),
            ("API key", mask_secret(&self.aggregator.api_key)),
            ("API key header", self.aggregator.api_key_header.clone()),
            (
                "Version header",
                format!("{}: {}", self.aggregator.version_header, self.aggregator.api_version),
            ),
            ("Aggregator timeout", format!("{} ms", self.aggregator.timeout_ms)),
            ("Debounce", format!("{} ms", self.orchestrator.debounce_ms)),
            ("Quote TTL", format!("{} ms", self.orchestrator.quote_ttl_ms)),
            (
                "Receipt polling",
                format!(
                    "every {} ms, up to {} ms",
                    self.orchestrator.receipt_poll_ms, self.orchestrator.receipt_timeout_ms
                ),
            ),
            ("Success display", format!("{} ms", self.orchestrator.success_display_ms)),
            ("Error clear", format!("{} ms", self.orchestrator.error_clear_ms)),
            ("RPC URL", self.rpc_url.clone().unwrap_or_else(|| "(not set)".to_string())),
        ]
    }
}
