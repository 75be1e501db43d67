//! Error handling for the swap core
//!
//! Every failure in the price → quote → approval → execution pipeline is a
//! `SwapError`. Each variant carries its `SwapErrorKind` so callers branch on
//! the tag instead of inspecting message text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error category, surfaced to UI consumers next to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapErrorKind {
    Validation,
    UnsupportedChain,
    IdenticalTokens,
    Upstream,
    UpstreamUnreachable,
    Approval,
    Execution,
    Config,
}

/// Swap pipeline error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SwapError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Chain {0} is not supported")]
    UnsupportedChain(u64),

    #[error("Cannot swap same token")]
    IdenticalTokens,

    #[error("{reason}")]
    Upstream { status: u16, reason: String },

    #[error("Aggregator unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("Invalid aggregator response: {0}")]
    InvalidResponse(String),

    #[error("Approval failed: {0}")]
    Approval(String),

    #[error("{0}")]
    Execution(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SwapError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid amount error
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::InvalidAmount(message.into())
    }

    /// Create an upstream error from a non-2xx status and an optional `reason`
    pub fn upstream(status: u16, reason: Option<String>) -> Self {
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| format!("API Error {status}"));
        Self::Upstream { status, reason }
    }

    /// Create an unreachable-upstream error
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::UpstreamUnreachable(message.into())
    }

    /// Create an approval error
    pub fn approval(message: impl Into<String>) -> Self {
        Self::Approval(message.into())
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn kind(&self) -> SwapErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidAmount(_) => SwapErrorKind::Validation,
            Self::UnsupportedChain(_) => SwapErrorKind::UnsupportedChain,
            Self::IdenticalTokens => SwapErrorKind::IdenticalTokens,
            Self::Upstream { .. } | Self::InvalidResponse(_) => SwapErrorKind::Upstream,
            Self::UpstreamUnreachable(_) => SwapErrorKind::UpstreamUnreachable,
            Self::Approval(_) => SwapErrorKind::Approval,
            Self::Execution(_) => SwapErrorKind::Execution,
            Self::Config(_) => SwapErrorKind::Config,
        }
    }

    /// True for failures raised locally before any network call.
    pub fn is_local(&self) -> bool {
        matches!(
            self.kind(),
            SwapErrorKind::Validation | SwapErrorKind::UnsupportedChain | SwapErrorKind::IdenticalTokens
        )
    }

    /// Upstream 5xx, upstream 429 and transport failures are worth retrying.
    /// Upstream 4xx means the request itself was rejected.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream { status, .. } => *status >= 500 || *status == 429,
            Self::UpstreamUnreachable(_) | Self::InvalidResponse(_) => true,
            _ => false,
        }
    }

    /// Message shown to the end user. Input problems read as-is; network and
    /// upstream problems get a prefix so they read as "try again later".
    pub fn user_message(&self) -> String {
        match self.kind() {
            SwapErrorKind::Upstream => format!("Service error: {self}"),
            SwapErrorKind::UpstreamUnreachable => format!("Network error: {self}"),
            _ => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for SwapError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::UpstreamUnreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SwapError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(format!("JSON error: {}", err))
    }
}

/// Result type for swap operations
pub type SwapResult<T> = Result<T, SwapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_reason_fallback() {
        let err = SwapError::upstream(502, None);
        assert_eq!(err.to_string(), "API Error 502");

        let err = SwapError::upstream(400, Some("  ".to_string()));
        assert_eq!(err.to_string(), "API Error 400");

        let err = SwapError::upstream(503, Some("insufficient liquidity".to_string()));
        assert_eq!(err.to_string(), "insufficient liquidity");
    }

    #[test]
    fn test_kinds_and_retryability() {
        assert_eq!(SwapError::IdenticalTokens.kind(), SwapErrorKind::IdenticalTokens);
        assert_eq!(SwapError::invalid_amount("x").kind(), SwapErrorKind::Validation);
        assert!(SwapError::UnsupportedChain(5).is_local());

        assert!(SwapError::upstream(503, None).is_retryable());
        assert!(SwapError::upstream(429, None).is_retryable());
        assert!(!SwapError::upstream(400, None).is_retryable());
        assert!(SwapError::unreachable("timeout").is_retryable());
        assert!(!SwapError::approval("rejected").is_retryable());
    }

    #[test]
    fn test_user_message_prefixes() {
        assert_eq!(SwapError::IdenticalTokens.user_message(), "Cannot swap same token");
        assert_eq!(
            SwapError::upstream(503, Some("insufficient liquidity".into())).user_message(),
            "Service error: insufficient liquidity"
        );
        assert!(SwapError::unreachable("dns").user_message().starts_with("Network error: "));
        assert_eq!(SwapError::approval("user rejected").user_message(), "Approval failed: user rejected");
    }
}
