use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use swapgate_core::{SwapError, SwapErrorKind};

/// Main error type for the SwapGate relay
#[derive(Debug, Clone, PartialEq)]
pub enum RelayError {
    // Request validation errors, raised before the aggregator is called
    Validation(ValidationError),

    // Failures from the swap core, tagged with the endpoint they came from
    Swap { context: SwapContext, error: SwapError },

    // Too many requests from one client
    RateLimited { retry_after_secs: u64 },

    // Generic errors
    Generic(String),
}

/// Which boundary endpoint produced a swap failure. Selects the generic
/// message shown when the upstream is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapContext {
    Price,
    Quote,
}

impl SwapContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapContext::Price => "price",
            SwapContext::Quote => "quote",
        }
    }

    pub fn unavailable_message(&self) -> &'static str {
        match self {
            SwapContext::Price => "Exchange rate unavailable",
            SwapContext::Quote => "Quote unavailable",
        }
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Validation(e) => write!(f, "Validation error: {e}"),
            RelayError::Swap { context, error } => write!(f, "Swap {} error: {error}", context.as_str()),
            RelayError::RateLimited { retry_after_secs } => {
                write!(f, "Rate limit exceeded, retry after {retry_after_secs}s")
            }
            RelayError::Generic(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for RelayError {}

impl RelayError {
    pub fn price(error: SwapError) -> Self {
        RelayError::Swap { context: SwapContext::Price, error }
    }

    pub fn quote(error: SwapError) -> Self {
        RelayError::Swap { context: SwapContext::Quote, error }
    }

    /// Status, machine-readable code and client-facing message.
    ///
    /// Raw upstream bodies never reach the client: 5xx and transport failures
    /// collapse to a per-endpoint message, 4xx keeps only the extracted reason.
    pub fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            RelayError::Validation(e) => (StatusCode::BAD_REQUEST, e.code(), e.to_string()),
            RelayError::Swap { context, error } => classify_swap_error(*context, error),
            RelayError::RateLimited { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", "Rate limit exceeded".to_string())
            }
            RelayError::Generic(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }

    pub fn to_http_response(&self) -> (StatusCode, serde_json::Value) {
        let (status_code, code, message) = self.classify();
        let mut body = serde_json::json!({
            "success": false,
            "error": message,
            "code": code,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let RelayError::RateLimited { retry_after_secs } = self {
            body["retryAfter"] = serde_json::json!(retry_after_secs);
        }
        (status_code, body)
    }
}

fn classify_swap_error(context: SwapContext, error: &SwapError) -> (StatusCode, &'static str, String) {
    match (error.kind(), error) {
        (SwapErrorKind::UnsupportedChain, _) => (StatusCode::BAD_REQUEST, "UNSUPPORTED_CHAIN", error.to_string()),
        (SwapErrorKind::IdenticalTokens, _) => (StatusCode::BAD_REQUEST, "IDENTICAL_TOKENS", error.to_string()),
        (SwapErrorKind::Validation, _) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", error.to_string()),
        (_, SwapError::Upstream { status, reason }) if (400..500).contains(status) && *status != 429 => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "SWAP_REJECTED",
            format!("Swap request rejected: {reason}"),
        ),
        _ if error.is_retryable() => (
            StatusCode::SERVICE_UNAVAILABLE,
            "UPSTREAM_UNAVAILABLE",
            context.unavailable_message().to_string(),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error".to_string(),
        ),
    }
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        self.classify().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, body) = self.to_http_response();
        HttpResponse::build(status).json(body)
    }
}

impl From<ValidationError> for RelayError {
    fn from(err: ValidationError) -> Self {
        RelayError::Validation(err)
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(err: anyhow::Error) -> Self {
        RelayError::Generic(err.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Validation(ValidationError::InvalidJson(err.to_string()))
    }
}

// Validation Errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    MissingFields(Vec<String>),
    InvalidSellAmount,
    NonIntegerSellAmount(String),
    InvalidSlippage,
    IdenticalTokens,
    UnsupportedChain(u64),
    InvalidAddress { field: String, value: String },
    InvalidJson(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingFields(fields) => {
                write!(f, "Missing required fields: {}", fields.join(", "))
            }
            ValidationError::InvalidSellAmount => write!(f, "Sell amount must be greater than 0"),
            ValidationError::NonIntegerSellAmount(value) => {
                write!(f, "Sell amount must be a whole number of base units: {value}")
            }
            ValidationError::InvalidSlippage => write!(f, "Slippage must be between 0 and 5%"),
            ValidationError::IdenticalTokens => write!(f, "Cannot swap same token"),
            ValidationError::UnsupportedChain(chain_id) => write!(f, "Chain {chain_id} is not supported"),
            ValidationError::InvalidAddress { field, value } => write!(f, "Invalid {field} address: {value}"),
            ValidationError::InvalidJson(msg) => write!(f, "Invalid JSON payload: {msg}"),
        }
    }
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingFields(_) => "MISSING_FIELDS",
            ValidationError::InvalidSellAmount => "INVALID_AMOUNT",
            ValidationError::NonIntegerSellAmount(_) => "INVALID_AMOUNT_FORMAT",
            ValidationError::InvalidSlippage => "INVALID_SLIPPAGE",
            ValidationError::IdenticalTokens => "IDENTICAL_TOKENS",
            ValidationError::UnsupportedChain(_) => "UNSUPPORTED_CHAIN",
            ValidationError::InvalidAddress { .. } => "INVALID_ADDRESS",
            ValidationError::InvalidJson(_) => "INVALID_JSON",
        }
    }
}

/// Relay configuration errors, raised at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    MissingConfig(String),
    InvalidConfig(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingConfig(key) => write!(f, "Missing configuration: {key}"),
            ConfigError::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_and_message(err: RelayError) -> (StatusCode, String) {
        let (status, body) = err.to_http_response();
        assert_eq!(body["success"], false);
        assert!(body["timestamp"].is_string());
        (status, body["error"].as_str().unwrap_or_default().to_string())
    }

    #[test]
    fn test_validation_messages() {
        let missing = ValidationError::MissingFields(vec!["sellToken".into(), "taker".into()]);
        assert_eq!(missing.to_string(), "Missing required fields: sellToken, taker");
        assert_eq!(ValidationError::UnsupportedChain(56).to_string(), "Chain 56 is not supported");

        let (status, message) = status_and_message(ValidationError::InvalidSlippage.into());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Slippage must be between 0 and 5%");
    }

    #[test]
    fn test_local_swap_errors_are_bad_requests() {
        let (status, message) = status_and_message(RelayError::price(SwapError::IdenticalTokens));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Cannot swap same token");

        let (status, _) = status_and_message(RelayError::quote(SwapError::UnsupportedChain(56)));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_unavailable_hides_reason() {
        let err = SwapError::upstream(503, Some("node pool exhausted".into()));
        let (status, message) = status_and_message(RelayError::price(err.clone()));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(message, "Exchange rate unavailable");

        let (status, message) = status_and_message(RelayError::quote(err));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(message, "Quote unavailable");

        let (status, _) = status_and_message(RelayError::price(SwapError::upstream(429, None)));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = status_and_message(RelayError::quote(SwapError::unreachable("connection refused")));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_upstream_rejection_is_unprocessable() {
        let err = SwapError::upstream(400, Some("Insufficient liquidity".into()));
        let (status, message) = status_and_message(RelayError::quote(err));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(message, "Swap request rejected: Insufficient liquidity");
    }

    #[test]
    fn test_everything_else_is_internal() {
        let (status, message) = status_and_message(RelayError::price(SwapError::execution("boom")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");

        let (status, _) = status_and_message(RelayError::Generic("secret detail".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_rate_limited_body() {
        let (status, body) = RelayError::RateLimited { retry_after_secs: 12 }.to_http_response();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["retryAfter"], 12);
        assert_eq!(body["code"], "RATE_LIMITED");
    }
}
