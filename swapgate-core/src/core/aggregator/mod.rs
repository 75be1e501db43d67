//! Aggregator client
//!
//! Thin HTTP client over the upstream swap aggregator's allowance-holder API.
//! It owns request validation that must happen before any network call and
//! the mapping from upstream HTTP failures to `SwapError`. No caching and no
//! retries: every call is a fresh request.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::core::amount::parse_base_units;
use crate::shared::constants::{
    DEFAULT_AGGREGATOR_TIMEOUT_MS, DEFAULT_AGGREGATOR_URL, DEFAULT_API_KEY_HEADER,
    DEFAULT_API_VERSION, DEFAULT_VERSION_HEADER, PRICE_PATH, QUOTE_PATH, SUPPORTED_CHAIN_IDS,
};
use crate::shared::error::{SwapError, SwapResult};
use crate::shared::types::{SwapParams, SwapPrice, SwapQuote};
use crate::shared::utils::{addresses_equal, validate_ethereum_address};

/// Price and quote source consumed by the orchestrator and the relay.
#[async_trait]
pub trait SwapAggregator: Send + Sync {
    /// Indicative price. Non-binding, safe to call on every keystroke.
    async fn get_price(&self, params: &SwapParams) -> SwapResult<SwapPrice>;

    /// Firm quote with executable calldata.
    async fn get_quote(&self, params: &SwapParams) -> SwapResult<SwapQuote>;
}

/// Connection settings for the upstream aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_key_header: String,
    pub version_header: String,
    pub api_version: String,
    pub timeout_ms: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AGGREGATOR_URL.to_string(),
            api_key: String::new(),
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            version_header: DEFAULT_VERSION_HEADER.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_ms: DEFAULT_AGGREGATOR_TIMEOUT_MS,
        }
    }
}

impl AggregatorConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> SwapResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(SwapError::config(format!(
                "Aggregator URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.api_key_header.trim().is_empty() || self.version_header.trim().is_empty() {
            return Err(SwapError::config("Aggregator header names cannot be empty"));
        }
        if self.timeout_ms == 0 {
            return Err(SwapError::config("Aggregator timeout must be greater than 0"));
        }
        Ok(())
    }
}

/// Checks run before any request leaves the process, in this order:
/// chain allow-list, identical tokens, address format, amount.
pub fn validate_params(params: &SwapParams) -> SwapResult<()> {
    if !SUPPORTED_CHAIN_IDS.contains(&params.chain_id) {
        return Err(SwapError::UnsupportedChain(params.chain_id));
    }
    if addresses_equal(&params.sell_token, &params.buy_token) {
        return Err(SwapError::IdenticalTokens);
    }
    validate_ethereum_address(&params.sell_token)?;
    validate_ethereum_address(&params.buy_token)?;
    validate_ethereum_address(&params.taker)?;

    let amount = parse_base_units(params.amount.value())?;
    if amount.is_zero() {
        return Err(SwapError::invalid_amount("Amount must be greater than 0"));
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamErrorBody {
    reason: Option<String>,
    message: Option<String>,
}

/// Best-effort extraction of a human reason from a non-2xx body.
fn upstream_reason(body: &str) -> Option<String> {
    let parsed: UpstreamErrorBody = serde_json::from_str(body).ok()?;
    parsed.reason.or(parsed.message)
}

/// reqwest-backed `SwapAggregator`.
#[derive(Debug, Clone)]
pub struct AggregatorClient {
    client: Client,
    config: AggregatorConfig,
}

impl AggregatorClient {
    pub fn new(config: AggregatorConfig) -> SwapResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SwapError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: AggregatorConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    fn query(params: &SwapParams) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("chainId", params.chain_id.to_string()),
            ("sellToken", params.sell_token.clone()),
            ("buyToken", params.buy_token.clone()),
            (params.amount.query_key(), params.amount.value().to_string()),
            ("taker", params.taker.clone()),
        ];
        if let Some(bps) = params.slippage_bps {
            query.push(("slippageBps", bps.to_string()));
        }
        query
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &SwapParams) -> SwapResult<T> {
        validate_params(params)?;

        let url = format!("{}{}", self.config.base_url, path);
        let mut request = self
            .client
            .get(&url)
            .query(&Self::query(params))
            .header(self.config.version_header.as_str(), self.config.api_version.as_str());
        if !self.config.api_key.is_empty() {
            request = request.header(self.config.api_key_header.as_str(), self.config.api_key.as_str());
        }

        let started = Instant::now();
        let response = request.send().await.map_err(|e| {
            log::warn!("Aggregator {} unreachable for chain {}: {}", path, params.chain_id, e);
            SwapError::unreachable(e.to_string())
        })?;
        log::debug!(
            "Aggregator {} chain={} status={} elapsed={}ms",
            path,
            params.chain_id,
            response.status().as_u16(),
            started.elapsed().as_millis()
        );
        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> SwapResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = SwapError::upstream(status.as_u16(), upstream_reason(&body));
            if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                log::warn!("Aggregator returned {}: {}", status, err);
            } else {
                log::info!("Aggregator rejected request with {}: {}", status, err);
            }
            return Err(err);
        }

        let body = response.bytes().await.map_err(|e| SwapError::unreachable(e.to_string()))?;
        serde_json::from_slice::<T>(&body).map_err(|e| {
            log::warn!("Undecodable aggregator response: {}", e);
            SwapError::InvalidResponse(e.to_string())
        })
    }
}

#[async_trait]
impl SwapAggregator for AggregatorClient {
    async fn get_price(&self, params: &SwapParams) -> SwapResult<SwapPrice> {
        self.get(PRICE_PATH, params).await
    }

    async fn get_quote(&self, params: &SwapParams) -> SwapResult<SwapQuote> {
        self.get(QUOTE_PATH, params).await
    }
}
