//! Swap orchestrator
//!
//! Owns the swap form state machine:
//!
//! ```text
//! Idle -> FetchingPrice -> PriceReady -> FetchingQuote
//!      -> [AwaitingApproval -> Approving] -> Submitting -> Success -> Idle
//! ```
//!
//! Any step can fall into `Failed`, which clears back to a neutral state after
//! `error_clear_ms`. Intent edits are debounced; each edit bumps a generation
//! counter and aborts the previous fetch task, and results carrying an older
//! generation are discarded. A wallet chain change resets everything.

pub mod state;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::time::Instant;

use crate::core::aggregator::SwapAggregator;
use crate::core::amount::{parse_base_units, to_base_units};
use crate::core::slippage::{bps_to_percent, percent_to_bps};
use crate::core::transactions::{wait_for_receipt, Erc20Approval, ReceiptSource, TransactionSigner};
use crate::domain::entities::token::Token;
use crate::shared::constants::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_ERROR_CLEAR_MS, DEFAULT_QUOTE_TTL_MS, DEFAULT_RECEIPT_POLL_MS,
    DEFAULT_RECEIPT_TIMEOUT_MS, DEFAULT_SUCCESS_DISPLAY_MS,
};
use crate::shared::error::{SwapError, SwapResult};
use crate::shared::types::{
    Address, BaseUnits, ChainId, ReceiptStatus, SwapAmount, SwapParams, TransactionHash,
    TransactionRequest, WalletContext,
};

pub use state::{OrchestratorSnapshot, PriceDisplay, SwapStatus};
use state::State;

/// Timing knobs for the orchestrator, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub debounce_ms: u64,
    pub success_display_ms: u64,
    pub error_clear_ms: u64,
    pub receipt_timeout_ms: u64,
    pub receipt_poll_ms: u64,
    pub quote_ttl_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            success_display_ms: DEFAULT_SUCCESS_DISPLAY_MS,
            error_clear_ms: DEFAULT_ERROR_CLEAR_MS,
            receipt_timeout_ms: DEFAULT_RECEIPT_TIMEOUT_MS,
            receipt_poll_ms: DEFAULT_RECEIPT_POLL_MS,
            quote_ttl_ms: DEFAULT_QUOTE_TTL_MS,
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> SwapResult<()> {
        if self.receipt_poll_ms == 0 {
            return Err(SwapError::config("Receipt poll interval must be greater than 0"));
        }
        if self.receipt_timeout_ms < self.receipt_poll_ms {
            return Err(SwapError::config("Receipt timeout must be at least one poll interval"));
        }
        if self.quote_ttl_ms == 0 {
            return Err(SwapError::config("Quote TTL must be greater than 0"));
        }
        Ok(())
    }

    fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    fn success_display(&self) -> Duration {
        Duration::from_millis(self.success_display_ms)
    }

    fn error_clear(&self) -> Duration {
        Duration::from_millis(self.error_clear_ms)
    }

    fn receipt_timeout(&self) -> Duration {
        Duration::from_millis(self.receipt_timeout_ms)
    }

    fn receipt_poll(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms)
    }

    fn quote_ttl(&self) -> Duration {
        Duration::from_millis(self.quote_ttl_ms)
    }
}

fn as_approval_error(err: SwapError) -> SwapError {
    match err {
        SwapError::Approval(_) => err,
        other => SwapError::approval(other.to_string()),
    }
}

fn as_execution_error(err: SwapError) -> SwapError {
    match err {
        SwapError::Execution(_) => err,
        other => SwapError::execution(other.to_string()),
    }
}

fn cancelled() -> SwapError {
    SwapError::execution("Swap cancelled: wallet or intent changed")
}

struct Inner {
    aggregator: Arc<dyn SwapAggregator>,
    signer: Arc<dyn TransactionSigner>,
    receipts: Arc<dyn ReceiptSource>,
    config: OrchestratorConfig,
    state: RwLock<State>,
    snapshots: watch::Sender<OrchestratorSnapshot>,
}

/// Drives a single swap form. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SwapOrchestrator {
    inner: Arc<Inner>,
}

impl SwapOrchestrator {
    pub fn new(
        aggregator: Arc<dyn SwapAggregator>,
        signer: Arc<dyn TransactionSigner>,
        receipts: Arc<dyn ReceiptSource>,
        config: OrchestratorConfig,
    ) -> Self {
        let (snapshots, _) = watch::channel(OrchestratorSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                aggregator,
                signer,
                receipts,
                config,
                state: RwLock::new(State::default()),
                snapshots,
            }),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    pub async fn snapshot(&self) -> OrchestratorSnapshot {
        self.inner.state.read().await.snapshot()
    }

    /// Receives a fresh snapshot after every state transition.
    pub fn subscribe(&self) -> watch::Receiver<OrchestratorSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Update the typed amount. Empty or zero clears the price; anything
    /// unparseable fails immediately without a network call.
    pub async fn set_amount(&self, human: &str) -> SwapResult<()> {
        let mut state = self.inner.state.write().await;
        Self::ensure_editable(&state)?;
        state.intent.human_amount = human.trim().to_string();
        self.inner.rearm(&mut state)
    }

    pub async fn set_tokens(&self, from: Option<Token>, to: Option<Token>) -> SwapResult<()> {
        let mut state = self.inner.state.write().await;
        Self::ensure_editable(&state)?;
        state.intent.from_token = from;
        state.intent.to_token = to;
        self.inner.rearm(&mut state)
    }

    pub async fn flip_tokens(&self) -> SwapResult<()> {
        let mut state = self.inner.state.write().await;
        Self::ensure_editable(&state)?;
        state.intent.flip();
        self.inner.rearm(&mut state)
    }

    /// Slippage is clamped to `[0, 5]` and snapped to whole basis points.
    pub async fn set_slippage(&self, percent: f64) -> SwapResult<()> {
        let mut state = self.inner.state.write().await;
        Self::ensure_editable(&state)?;
        state.intent.slippage_percent = bps_to_percent(percent_to_bps(percent));
        self.inner.rearm(&mut state)
    }

    /// Apply a wallet update. A chain switch or disconnect resets the form;
    /// an account switch on the same chain refetches the price.
    pub async fn on_wallet_changed(&self, wallet: WalletContext) {
        let mut state = self.inner.state.write().await;
        if state.wallet == wallet {
            return;
        }
        let chain_changed = state.wallet.chain_id != wallet.chain_id || !wallet.is_connected;
        log::info!(
            "Wallet changed (chain {:?} -> {:?}, connected={})",
            state.wallet.chain_id,
            wallet.chain_id,
            wallet.is_connected
        );
        state.wallet = wallet;

        if chain_changed {
            state.generation += 1;
            state.abort_pending_fetch();
            let slippage = state.intent.slippage_percent;
            state.intent = Default::default();
            state.intent.slippage_percent = slippage;
            state.price = None;
            state.quote = None;
            state.error = None;
            state.status = SwapStatus::Idle;
            self.inner.publish(&state);
        } else if let Err(e) = self.inner.rearm(&mut state) {
            log::debug!("Intent invalid after account switch: {}", e);
        }
    }

    /// Fetch a firm quote for the current price and execute it, approving the
    /// sell token first when the quote reports an allowance shortfall.
    pub async fn confirm_swap(&self) -> SwapResult<TransactionHash> {
        let (generation, params, from) = {
            let mut state = self.inner.state.write().await;
            if state.status != SwapStatus::PriceReady {
                return Err(SwapError::validation("No price to confirm"));
            }
            let params = self
                .inner
                .price_params(&state)?
                .ok_or_else(|| SwapError::validation("Swap details are incomplete"))?;
            let from = state
                .intent
                .from_token
                .clone()
                .ok_or_else(|| SwapError::validation("Select both tokens"))?;
            state.status = SwapStatus::FetchingQuote;
            state.quote = None;
            state.error = None;
            self.inner.publish(&state);
            (state.generation, params, from)
        };

        match self.inner.execute(generation, &params, &from).await {
            Ok(hash) => Ok(hash),
            Err(e) => {
                let mut state = self.inner.state.write().await;
                if state.generation == generation {
                    state.quote = None;
                    self.inner.fail_locked(&mut state, e.clone());
                }
                Err(e)
            }
        }
    }

    fn ensure_editable(state: &State) -> SwapResult<()> {
        if state.status.is_executing() {
            return Err(SwapError::validation("A swap is already in progress"));
        }
        Ok(())
    }
}

impl Inner {
    fn publish(&self, state: &State) {
        self.snapshots.send_replace(state.snapshot());
    }

    /// Aggregator parameters for the current intent. `Ok(None)` means there
    /// is nothing to price yet (no wallet, missing token, empty or zero amount).
    fn price_params(&self, state: &State) -> SwapResult<Option<SwapParams>> {
        if state.intent.human_amount.is_empty() {
            return Ok(None);
        }
        let (taker, chain_id) = match (&state.wallet.address, state.wallet.chain_id) {
            (Some(address), Some(chain_id)) if state.wallet.is_connected => (address.clone(), chain_id),
            _ => return Ok(None),
        };
        if state.intent.from_token.is_none() || state.intent.to_token.is_none() {
            return Ok(None);
        }
        let (from, to) = state.intent.validate_pair(chain_id)?;
        let sell_amount = to_base_units(&state.intent.human_amount, from.decimals)?;
        if sell_amount == "0" {
            return Ok(None);
        }
        Ok(Some(SwapParams {
            chain_id,
            sell_token: from.address.clone(),
            buy_token: to.address.clone(),
            amount: SwapAmount::Sell(sell_amount),
            taker,
            slippage_bps: Some(percent_to_bps(state.intent.slippage_percent)),
        }))
    }

    /// Invalidate whatever is in flight and schedule a debounced price fetch
    /// for the current intent.
    fn rearm(self: &Arc<Self>, state: &mut State) -> SwapResult<()> {
        state.generation += 1;
        state.abort_pending_fetch();
        state.price = None;
        state.quote = None;
        state.error = None;
        state.status = SwapStatus::Idle;

        let params = match self.price_params(state) {
            Ok(Some(params)) => params,
            Ok(None) => {
                self.publish(state);
                return Ok(());
            }
            Err(e) => {
                self.fail_locked(state, e.clone());
                return Err(e);
            }
        };
        self.publish(state);

        let generation = state.generation;
        let inner = Arc::clone(self);
        state.pending_fetch = Some(tokio::spawn(async move {
            inner.debounced_fetch(generation, params).await;
        }));
        Ok(())
    }

    async fn debounced_fetch(self: Arc<Self>, generation: u64, params: SwapParams) {
        tokio::time::sleep(self.config.debounce()).await;
        {
            let mut state = self.state.write().await;
            if state.generation != generation {
                return;
            }
            state.status = SwapStatus::FetchingPrice;
            self.publish(&state);
        }

        let result = self.aggregator.get_price(&params).await;

        let mut state = self.state.write().await;
        if state.generation != generation {
            log::debug!("Dropping price for superseded generation {}", generation);
            return;
        }
        match result {
            Ok(price) => {
                state.price = Some(price);
                state.status = SwapStatus::PriceReady;
                self.publish(&state);
            }
            Err(e) => {
                state.price = None;
                self.fail_locked(&mut state, e);
            }
        }
    }

    fn fail_locked(self: &Arc<Self>, state: &mut State, err: SwapError) {
        if err.is_local() {
            log::debug!("Swap input rejected: {}", err);
        } else {
            log::warn!("Swap failed in {:?}: {}", state.status, err);
        }
        state.status = SwapStatus::Failed;
        state.error = Some(err);
        state.error_seq += 1;
        self.publish(state);

        let seq = state.error_seq;
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(inner.config.error_clear()).await;
            let mut state = inner.state.write().await;
            if state.error_seq == seq && state.status == SwapStatus::Failed {
                state.error = None;
                state.status = if state.price.is_some() {
                    SwapStatus::PriceReady
                } else {
                    SwapStatus::Idle
                };
                inner.publish(&state);
            }
        });
    }

    /// Apply `update` if `generation` is still current.
    async fn advance<F>(&self, generation: u64, update: F) -> SwapResult<()>
    where
        F: FnOnce(&mut State),
    {
        let mut state = self.state.write().await;
        if state.generation != generation {
            return Err(cancelled());
        }
        update(&mut state);
        self.publish(&state);
        Ok(())
    }

    async fn execute(
        self: &Arc<Self>,
        generation: u64,
        params: &SwapParams,
        from: &Token,
    ) -> SwapResult<TransactionHash> {
        let mut quote = self.aggregator.get_quote(params).await?;
        let fetched_at = Instant::now();
        self.advance(generation, |s| s.quote = Some((quote.clone(), fetched_at))).await?;

        if from.requires_allowance() {
            if let Some(issue) = quote.allowance_issue().cloned() {
                let needed = parse_base_units(&quote.price.sell_amount)?;
                let actual = parse_base_units(&issue.actual).unwrap_or_default();
                if actual < needed {
                    log::info!("Allowance {} below {}, requesting approval", actual, needed);
                    self.approve(
                        generation,
                        params.chain_id,
                        from,
                        issue.spender,
                        quote.price.sell_amount.clone(),
                    )
                    .await?;
                }
            }
        }

        if fetched_at.elapsed() > self.config.quote_ttl() {
            log::info!("Quote older than {:?}, fetching a fresh one", self.config.quote_ttl());
            self.advance(generation, |s| s.status = SwapStatus::FetchingQuote).await?;
            quote = self.aggregator.get_quote(params).await?;
        }

        let refreshed = Instant::now();
        self.advance(generation, |s| {
            s.status = SwapStatus::Submitting;
            s.quote = Some((quote.clone(), refreshed));
        })
        .await?;

        let mut transaction = TransactionRequest::from(&quote);
        transaction.chain_id = params.chain_id;
        let hash = self
            .signer
            .send_transaction(transaction)
            .await
            .map_err(as_execution_error)?;
        log::info!("Swap submitted on chain {}: {}", params.chain_id, hash);

        let recorded = self
            .advance(generation, |s| {
                s.status = SwapStatus::Success;
                s.quote = None;
                s.last_tx_hash = Some(hash.clone());
            })
            .await;
        if recorded.is_ok() {
            self.schedule_success_reset(generation);
        }
        Ok(hash)
    }

    async fn approve(
        &self,
        generation: u64,
        chain_id: ChainId,
        token: &Token,
        spender: Address,
        amount: BaseUnits,
    ) -> SwapResult<()> {
        self.advance(generation, |s| s.status = SwapStatus::AwaitingApproval).await?;
        let approval = Erc20Approval { chain_id, token: token.address.clone(), spender, amount };
        let hash = self.signer.approve(approval).await.map_err(as_approval_error)?;

        self.advance(generation, |s| s.status = SwapStatus::Approving).await?;
        let status = wait_for_receipt(
            self.receipts.as_ref(),
            &hash,
            self.config.receipt_timeout(),
            self.config.receipt_poll(),
        )
        .await;
        match status {
            ReceiptStatus::Confirmed => Ok(()),
            ReceiptStatus::Reverted => Err(SwapError::approval("transaction reverted")),
            ReceiptStatus::Pending => Err(SwapError::approval("transaction still pending")),
        }
    }

    fn schedule_success_reset(self: &Arc<Self>, generation: u64) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(inner.config.success_display()).await;
            let mut state = inner.state.write().await;
            if state.generation == generation && state.status == SwapStatus::Success {
                state.status = SwapStatus::Idle;
                state.intent.human_amount.clear();
                state.price = None;
                inner.publish(&state);
            }
        });
    }
}
