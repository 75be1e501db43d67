//! Orchestrator state and the snapshots published to UI consumers

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::core::amount::{
    effective_rate, format_base_units, gas_cost_in_native, min_received, parse_human_f64,
    price_impact_percent, to_human_units_default,
};
use crate::core::slippage::percent_to_bps;
use crate::domain::entities::intent::SwapIntent;
use crate::shared::error::{SwapError, SwapErrorKind};
use crate::shared::types::{SwapPrice, SwapQuote, TransactionHash, WalletContext};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    #[default]
    Idle,
    FetchingPrice,
    PriceReady,
    FetchingQuote,
    AwaitingApproval,
    Approving,
    Submitting,
    Success,
    Failed,
}

impl SwapStatus {
    /// A quote/approval/submission sequence owns the state.
    pub fn is_executing(&self) -> bool {
        matches!(
            self,
            SwapStatus::FetchingQuote
                | SwapStatus::AwaitingApproval
                | SwapStatus::Approving
                | SwapStatus::Submitting
        )
    }
}

/// Values derived from the current price for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDisplay {
    pub buy_amount: String,
    pub effective_rate: f64,
    pub price_impact_percent: f64,
    pub min_received: f64,
    pub gas_cost: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorSnapshot {
    pub status: SwapStatus,
    pub intent: SwapIntent,
    pub wallet: WalletContext,
    pub price: Option<SwapPrice>,
    pub has_quote: bool,
    pub error: Option<String>,
    pub error_kind: Option<SwapErrorKind>,
    pub last_tx_hash: Option<TransactionHash>,
    pub display: Option<PriceDisplay>,
}

impl Default for OrchestratorSnapshot {
    fn default() -> Self {
        State::default().snapshot()
    }
}

#[derive(Debug, Default)]
pub(crate) struct State {
    pub status: SwapStatus,
    pub intent: SwapIntent,
    pub wallet: WalletContext,
    pub price: Option<SwapPrice>,
    pub quote: Option<(SwapQuote, Instant)>,
    pub error: Option<SwapError>,
    pub last_tx_hash: Option<TransactionHash>,
    /// Bumped on every intent or wallet change; results tagged with an older
    /// generation are dropped.
    pub generation: u64,
    /// Bumped on every failure so a stale error-clear timer does nothing.
    pub error_seq: u64,
    pub pending_fetch: Option<JoinHandle<()>>,
}

impl State {
    pub fn abort_pending_fetch(&mut self) {
        if let Some(handle) = self.pending_fetch.take() {
            handle.abort();
        }
    }

    fn display(&self) -> Option<PriceDisplay> {
        let price = self.price.as_ref()?;
        let from = self.intent.from_token.as_ref()?;
        let to = self.intent.to_token.as_ref()?;

        let sell = parse_human_f64(&format_base_units(&price.sell_amount, from.decimals).ok()?);
        let buy = parse_human_f64(&format_base_units(&price.buy_amount, to.decimals).ok()?);
        let bps = percent_to_bps(self.intent.slippage_percent);
        let gas_price = price.gas_price.as_deref().unwrap_or("0");

        Some(PriceDisplay {
            buy_amount: to_human_units_default(&price.buy_amount, to.decimals),
            effective_rate: effective_rate(sell, buy),
            price_impact_percent: price_impact_percent(sell, buy, parse_human_f64(&price.price)),
            min_received: min_received(buy, bps),
            gas_cost: gas_cost_in_native(&price.estimated_gas, gas_price),
        })
    }

    pub fn snapshot(&self) -> OrchestratorSnapshot {
        OrchestratorSnapshot {
            status: self.status,
            intent: self.intent.clone(),
            wallet: self.wallet.clone(),
            price: self.price.clone(),
            has_quote: self.quote.is_some(),
            error: self.error.as_ref().map(SwapError::user_message),
            error_kind: self.error.as_ref().map(SwapError::kind),
            last_tx_hash: self.last_tx_hash.clone(),
            display: self.display(),
        }
    }
}
