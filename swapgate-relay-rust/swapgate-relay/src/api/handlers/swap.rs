use actix_web::web::{Data, Json, Path};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use swapgate_core::core::amount::parse_base_units;
use swapgate_core::core::slippage::{percent_to_bps, validate_slippage_percent};
use swapgate_core::core::tokens::{recommended_pairs, tokens_for_chain};
use swapgate_core::shared::constants::{
    DEFAULT_SLIPPAGE_PERCENT, MAX_SLIPPAGE_PERCENT, MIN_SLIPPAGE_PERCENT, SLIPPAGE_PRESETS,
};
use swapgate_core::shared::utils::{addresses_equal, validate_ethereum_address};
use swapgate_core::{Network, SwapAggregator, SwapAmount, SwapParams};

use crate::domain::error::{RelayError, SwapContext, ValidationError};
use crate::infrastructure::config::Config;
use crate::infrastructure::logger::Logger;

/// Shared handler state.
pub struct AppState {
    pub aggregator: Arc<dyn SwapAggregator>,
    pub config: Config,
}

impl AppState {
    pub fn new(aggregator: Arc<dyn SwapAggregator>, config: Config) -> Self {
        Self { aggregator, config }
    }
}

/// Body of `POST /swap/price` and `POST /swap/quote`.
///
/// Every field is optional at the serde level so that absent fields are
/// reported together instead of failing on the first one.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub chain_id: Option<u64>,
    pub sell_token: Option<String>,
    pub buy_token: Option<String>,
    /// Integer base units, as a string or a JSON number.
    pub sell_amount: Option<serde_json::Value>,
    pub taker: Option<String>,
    /// Percent in `[0, 5]`.
    pub slippage: Option<f64>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn amount_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl SwapRequest {
    /// Validates the request and builds upstream parameters.
    ///
    /// Order: missing fields, sell amount, slippage, identical tokens, chain,
    /// address format.
    pub fn into_params(self, config: &Config) -> Result<SwapParams, ValidationError> {
        let sell_amount = self.sell_amount.as_ref().and_then(amount_text);

        let mut missing = Vec::new();
        if self.chain_id.is_none() {
            missing.push("chainId".to_string());
        }
        if present(&self.sell_token).is_none() {
            missing.push("sellToken".to_string());
        }
        if present(&self.buy_token).is_none() {
            missing.push("buyToken".to_string());
        }
        if sell_amount.is_none() {
            missing.push("sellAmount".to_string());
        }
        if present(&self.taker).is_none() {
            missing.push("taker".to_string());
        }
        let (Some(chain_id), Some(sell_token), Some(buy_token), Some(sell_amount), Some(taker)) = (
            self.chain_id,
            present(&self.sell_token),
            present(&self.buy_token),
            sell_amount,
            present(&self.taker),
        ) else {
            return Err(ValidationError::MissingFields(missing));
        };

        // Floats such as 1e18 and negative numbers are not base units.
        match parse_base_units(&sell_amount) {
            Ok(amount) if amount.is_zero() => return Err(ValidationError::InvalidSellAmount),
            Ok(_) => {}
            Err(_) => return Err(ValidationError::NonIntegerSellAmount(sell_amount)),
        }

        let slippage_bps = self
            .slippage
            .map(|percent| {
                validate_slippage_percent(percent)
                    .map(percent_to_bps)
                    .map_err(|_| ValidationError::InvalidSlippage)
            })
            .transpose()?;

        if addresses_equal(sell_token, buy_token) {
            return Err(ValidationError::IdenticalTokens);
        }
        if !config.is_chain_supported(chain_id) {
            return Err(ValidationError::UnsupportedChain(chain_id));
        }
        for (field, value) in [("sellToken", sell_token), ("buyToken", buy_token), ("taker", taker)] {
            if validate_ethereum_address(value).is_err() {
                return Err(ValidationError::InvalidAddress { field: field.to_string(), value: value.to_string() });
            }
        }

        Ok(SwapParams {
            chain_id,
            sell_token: sell_token.to_string(),
            buy_token: buy_token.to_string(),
            amount: SwapAmount::Sell(sell_amount),
            taker: taker.to_string(),
            slippage_bps,
        })
    }
}

async fn serve(
    state: &AppState,
    context: SwapContext,
    request: SwapRequest,
) -> Result<HttpResponse, RelayError> {
    let started = Instant::now();
    let chain_id = request.chain_id.unwrap_or_default();
    let kind = context.as_str();

    let params = request.into_params(&state.config).map_err(|e| {
        Logger::swap_failed(kind, chain_id, 400, &e.to_string());
        RelayError::from(e)
    })?;
    Logger::swap_request(kind, params.chain_id, &params.sell_token, &params.buy_token);

    let body = match context {
        SwapContext::Price => state
            .aggregator
            .get_price(&params)
            .await
            .map(|price| json!({ "success": true, "price": price, "timestamp": chrono::Utc::now().to_rfc3339() })),
        SwapContext::Quote => state
            .aggregator
            .get_quote(&params)
            .await
            .map(|quote| json!({ "success": true, "quote": quote, "timestamp": chrono::Utc::now().to_rfc3339() })),
    };

    match body {
        Ok(body) => {
            Logger::swap_served(kind, params.chain_id, started.elapsed().as_millis());
            Ok(HttpResponse::Ok().json(body))
        }
        Err(error) => {
            let err = RelayError::Swap { context, error };
            let (status, _, _) = err.classify();
            // Full upstream detail stays in the logs.
            Logger::swap_failed(kind, params.chain_id, status.as_u16(), &err.to_string());
            Err(err)
        }
    }
}

#[post("/swap/price")]
pub async fn swap_price(state: Data<AppState>, body: Json<SwapRequest>) -> Result<HttpResponse, RelayError> {
    serve(&state, SwapContext::Price, body.into_inner()).await
}

#[post("/swap/quote")]
pub async fn swap_quote(state: Data<AppState>, body: Json<SwapRequest>) -> Result<HttpResponse, RelayError> {
    serve(&state, SwapContext::Quote, body.into_inner()).await
}

fn endpoint_status(state: &AppState, context: SwapContext) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Swap {} endpoint is available", context.as_str()),
        "supportedChains": state.config.supported_chains,
        "slippage": {
            "min": MIN_SLIPPAGE_PERCENT,
            "max": MAX_SLIPPAGE_PERCENT,
            "default": DEFAULT_SLIPPAGE_PERCENT,
            "presets": SLIPPAGE_PRESETS,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[get("/swap/price")]
pub async fn swap_price_status(state: Data<AppState>) -> impl Responder {
    endpoint_status(&state, SwapContext::Price)
}

#[get("/swap/quote")]
pub async fn swap_quote_status(state: Data<AppState>) -> impl Responder {
    endpoint_status(&state, SwapContext::Quote)
}

#[get("/swap/tokens/{chain_id}")]
pub async fn swap_tokens(state: Data<AppState>, path: Path<u64>) -> Result<HttpResponse, RelayError> {
    let chain_id = path.into_inner();
    let network = match Network::from_chain_id(chain_id) {
        Some(network) if state.config.is_chain_supported(chain_id) => network,
        _ => return Err(ValidationError::UnsupportedChain(chain_id).into()),
    };

    let pairs: Vec<_> = recommended_pairs(chain_id)
        .into_iter()
        .map(|(sell, buy)| json!({ "sellToken": sell, "buyToken": buy }))
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "chainId": chain_id,
        "network": network.name(),
        "nativeCurrency": network.native_currency(),
        "tokens": tokens_for_chain(chain_id),
        "recommendedPairs": pairs,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

#[get("/health")]
pub async fn health(state: Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "swapgate-relay",
        "version": state.config.version,
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Registers the swap routes and a JSON extractor that reports malformed
/// bodies in the relay's error format.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        RelayError::from(ValidationError::InvalidJson(err.to_string())).into()
    }))
    .service(health)
    .service(swap_price)
    .service(swap_price_status)
    .service(swap_quote)
    .service(swap_quote_status)
    .service(swap_tokens);
}
