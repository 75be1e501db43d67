//! SwapGate Core
//!
//! Token swap aggregation pipeline: turns "swap X of token A for token B with
//! Y% slippage" into an indicative price, a firm quote and a submitted
//! transaction.
//!
//! ## Architecture
//!
//! - **Core**: amount conversion, slippage codec, token directory, aggregator
//!   client, transaction collaborators, swap orchestrator
//! - **Domain**: tokens, networks and the user's swap intent
//! - **Shared**: wire types, error taxonomy, constants and utilities
//!
//! Signing is never done here. The host supplies a `TransactionSigner`; the
//! core only builds calldata and watches receipts.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use swapgate_core::{init_swap_core, WalletContext};
//! # use swapgate_core::core::transactions::TransactionSigner;
//! # async fn run(signer: Arc<dyn TransactionSigner>) -> Result<(), swapgate_core::SwapError> {
//! let core = init_swap_core()?;
//! let orchestrator = core.orchestrator(signer)?;
//! orchestrator.on_wallet_changed(WalletContext::connected("0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6", 1)).await;
//! orchestrator.set_amount("1.5").await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub mod config;
pub mod core;
pub mod domain;
pub mod shared;

pub use crate::config::SwapCoreConfig;
pub use crate::core::aggregator::{AggregatorClient, AggregatorConfig, SwapAggregator};
pub use crate::core::orchestrator::{
    OrchestratorConfig, OrchestratorSnapshot, SwapOrchestrator, SwapStatus,
};
pub use crate::core::transactions::{
    Erc20Approval, ReceiptSource, RpcReceiptSource, TransactionSigner,
};
pub use crate::domain::{Network, SwapIntent, Token};
pub use crate::shared::error::{SwapError, SwapErrorKind, SwapResult};
pub use crate::shared::types::{
    SwapAmount, SwapParams, SwapPrice, SwapQuote, TransactionHash, TransactionRequest,
    WalletContext,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Install `env_logger` for standalone use. Hosts with their own `log`
/// backend should skip this.
pub fn init() {
    if env_logger::try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Build the core from `SWAPGATE_*` environment configuration.
pub fn init_swap_core() -> SwapResult<SwapCore> {
    SwapCore::new(SwapCoreConfig::from_env()?)
}

/// Configured aggregator client plus the optional receipt source.
#[derive(Clone)]
pub struct SwapCore {
    pub config: SwapCoreConfig,
    pub aggregator: Arc<AggregatorClient>,
    pub receipts: Option<Arc<RpcReceiptSource>>,
}

impl SwapCore {
    pub fn new(config: SwapCoreConfig) -> SwapResult<Self> {
        config.validate()?;
        let aggregator = Arc::new(AggregatorClient::new(config.aggregator.clone())?);
        let receipts = match &config.rpc_url {
            Some(url) => Some(Arc::new(RpcReceiptSource::new(url.clone(), config.aggregator.timeout())?)),
            None => None,
        };
        log::info!("SwapGate core {} ready against {}", VERSION, config.aggregator.base_url);
        Ok(Self { config, aggregator, receipts })
    }

    /// Orchestrator wired to this core. Requires an RPC URL for receipts.
    pub fn orchestrator(&self, signer: Arc<dyn TransactionSigner>) -> SwapResult<SwapOrchestrator> {
        let receipts = self
            .receipts
            .clone()
            .ok_or_else(|| SwapError::config("SWAPGATE_RPC_URL is required to watch approval receipts"))?;
        Ok(SwapOrchestrator::new(
            self.aggregator.clone(),
            signer,
            receipts,
            self.config.orchestrator.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transactions::MockTransactionSigner;

    #[test]
    fn test_swap_core_without_rpc_cannot_orchestrate() {
        let core = SwapCore::new(SwapCoreConfig::default()).expect("core");
        assert!(core.receipts.is_none());
        let err = core.orchestrator(Arc::new(MockTransactionSigner::new())).err().expect("error");
        assert!(matches!(err, SwapError::Config(_)));
    }

    #[tokio::test]
    async fn test_swap_core_with_rpc() {
        let config = SwapCoreConfig {
            rpc_url: Some("http://localhost:8545".to_string()),
            ..Default::default()
        };
        let core = SwapCore::new(config).expect("core");
        let orchestrator = core.orchestrator(Arc::new(MockTransactionSigner::new())).expect("orchestrator");
        assert_eq!(orchestrator.snapshot().await.status, SwapStatus::Idle);
    }
}
