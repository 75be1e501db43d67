//! Transaction collaborators
//!
//! The swap core never holds keys. Signing and broadcasting are delegated to
//! a `TransactionSigner`; confirmation is observed through a `ReceiptSource`.
//! `RpcReceiptSource` is the default receipt source, a JSON-RPC client for
//! `eth_getTransactionReceipt`.

use async_trait::async_trait;
use ethers::abi::{self, Token as AbiToken};
use ethers::types::{Address as EthAddress, U256};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::core::amount::parse_base_units;
use crate::shared::constants::ERC20_APPROVE_SELECTOR;
use crate::shared::error::{SwapError, SwapResult};
use crate::shared::types::{Address, BaseUnits, ChainId, ReceiptStatus, TransactionHash, TransactionRequest};
use crate::shared::utils::{bytes_to_hex, validate_ethereum_address};

/// ERC-20 `approve(spender, amount)` on `token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc20Approval {
    pub chain_id: ChainId,
    pub token: Address,
    pub spender: Address,
    pub amount: BaseUnits,
}

impl Erc20Approval {
    /// ABI-encoded `approve(address,uint256)` call.
    pub fn calldata(&self) -> SwapResult<String> {
        validate_ethereum_address(&self.spender)?;
        let spender: EthAddress = self
            .spender
            .parse()
            .map_err(|e| SwapError::validation(format!("Invalid spender {}: {e}", self.spender)))?;
        let amount: U256 = parse_base_units(&self.amount)?;

        let mut data = ERC20_APPROVE_SELECTOR.to_vec();
        data.extend(abi::encode(&[AbiToken::Address(spender), AbiToken::Uint(amount)]));
        Ok(bytes_to_hex(&data))
    }
}

/// Wallet-side signer. Implementations prompt the user and broadcast.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn approve(&self, approval: Erc20Approval) -> SwapResult<TransactionHash>;

    async fn send_transaction(&self, transaction: TransactionRequest) -> SwapResult<TransactionHash>;
}

#[async_trait]
pub trait ReceiptSource: Send + Sync {
    async fn receipt_status(&self, tx_hash: &str) -> SwapResult<ReceiptStatus>;
}

/// Poll `source` until the receipt is final or `timeout` elapses.
///
/// Lookup errors are logged and treated as "not yet". Returns
/// `ReceiptStatus::Pending` when the timeout is hit.
pub async fn wait_for_receipt(
    source: &dyn ReceiptSource,
    tx_hash: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> ReceiptStatus {
    let poll = async {
        loop {
            match source.receipt_status(tx_hash).await {
                Ok(ReceiptStatus::Pending) => {}
                Ok(status) => return status,
                Err(e) => log::warn!("Receipt lookup for {} failed: {}", tx_hash, e),
            }
            tokio::time::sleep(poll_interval).await;
        }
    };
    match tokio::time::timeout(timeout, poll).await {
        Ok(status) => status,
        Err(_) => {
            log::warn!("Receipt for {} still pending after {:?}", tx_hash, timeout);
            ReceiptStatus::Pending
        }
    }
}

/// `ReceiptSource` over a JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcReceiptSource {
    client: Client,
    rpc_url: String,
}

impl RpcReceiptSource {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> SwapResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SwapError::config(format!("Failed to build RPC client: {e}")))?;
        Ok(Self { client, rpc_url: rpc_url.into() })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

#[async_trait]
impl ReceiptSource for RpcReceiptSource {
    async fn receipt_status(&self, tx_hash: &str) -> SwapResult<ReceiptStatus> {
        if tx_hash.is_empty() {
            return Err(SwapError::validation("Transaction hash cannot be empty"));
        }
        let body = json!({
            "jsonrpc": "2.0",
            "method": "eth_getTransactionReceipt",
            "params": [tx_hash],
            "id": 1
        });
        let resp = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SwapError::unreachable(format!("Failed to get transaction receipt: {e}")))?;
        let resp_json: serde_json::Value = resp.json().await?;

        if let Some(error) = resp_json.get("error") {
            return Err(SwapError::InvalidResponse(format!("RPC error: {error}")));
        }
        let receipt = match resp_json.get("result") {
            Some(serde_json::Value::Null) | None => return Ok(ReceiptStatus::Pending),
            Some(receipt) => receipt,
        };
        // Pre-Byzantium receipts carry no status; treat them as confirmed
        match receipt.get("status").and_then(|s| s.as_str()) {
            Some("0x0") => Ok(ReceiptStatus::Reverted),
            _ => Ok(ReceiptStatus::Confirmed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SPENDER: &str = "0x0000000000001fF3684f28c67538d4D072C22734";
    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

    #[test]
    fn test_approve_calldata() {
        let approval = Erc20Approval {
            chain_id: 1,
            token: USDC.to_string(),
            spender: SPENDER.to_string(),
            amount: "1000000".to_string(),
        };
        let data = approval.calldata().unwrap();
        assert!(data.starts_with("0x095ea7b3"));
        // selector + two 32-byte words
        assert_eq!(data.len(), 2 + 8 + 64 * 2);
        assert!(data.ends_with("f4240"));
        assert!(data.contains("0000000000001ff3684f28c67538d4d072c22734"));
    }

    #[test]
    fn test_approve_rejects_bad_input() {
        let approval = Erc20Approval {
            chain_id: 1,
            token: USDC.to_string(),
            spender: "0x1234".to_string(),
            amount: "1".to_string(),
        };
        assert!(approval.calldata().is_err());

        let approval = Erc20Approval { spender: SPENDER.to_string(), amount: "-1".to_string(), ..approval };
        assert!(matches!(approval.calldata(), Err(SwapError::InvalidAmount(_))));
    }

    /// Reports `Pending` for the first `pending_polls` lookups, then `last`.
    struct ScriptedReceipts {
        pending_polls: usize,
        last: ReceiptStatus,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReceiptSource for ScriptedReceipts {
        async fn receipt_status(&self, _tx_hash: &str) -> SwapResult<ReceiptStatus> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.pending_polls {
                Ok(ReceiptStatus::Pending)
            } else {
                Ok(self.last)
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_receipt_polls_until_final() {
        let source = ScriptedReceipts { pending_polls: 3, last: ReceiptStatus::Confirmed, calls: AtomicUsize::new(0) };
        let status = wait_for_receipt(&source, "0xabc", Duration::from_secs(60), Duration::from_secs(2)).await;
        assert_eq!(status, ReceiptStatus::Confirmed);
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_receipt_reports_revert() {
        let source = ScriptedReceipts { pending_polls: 0, last: ReceiptStatus::Reverted, calls: AtomicUsize::new(0) };
        let status = wait_for_receipt(&source, "0xabc", Duration::from_secs(60), Duration::from_secs(2)).await;
        assert_eq!(status, ReceiptStatus::Reverted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_receipt_times_out() {
        let source = ScriptedReceipts { pending_polls: usize::MAX, last: ReceiptStatus::Confirmed, calls: AtomicUsize::new(0) };
        let status = wait_for_receipt(&source, "0xabc", Duration::from_secs(10), Duration::from_secs(2)).await;
        assert_eq!(status, ReceiptStatus::Pending);
        assert!(source.calls.load(Ordering::SeqCst) >= 5);
    }

    async fn rpc_with_result(result: serde_json::Value) -> (MockServer, RpcReceiptSource) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_getTransactionReceipt", "params": ["0xabc"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": result })))
            .expect(1)
            .mount(&server)
            .await;
        let source = RpcReceiptSource::new(server.uri(), Duration::from_secs(5)).expect("rpc source");
        (server, source)
    }

    #[tokio::test]
    async fn test_rpc_receipt_pending() {
        let (_server, source) = rpc_with_result(serde_json::Value::Null).await;
        assert_eq!(source.receipt_status("0xabc").await.unwrap(), ReceiptStatus::Pending);
    }

    #[tokio::test]
    async fn test_rpc_receipt_confirmed() {
        let (_server, source) = rpc_with_result(json!({ "status": "0x1", "blockNumber": "0x10" })).await;
        assert_eq!(source.receipt_status("0xabc").await.unwrap(), ReceiptStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_rpc_receipt_reverted() {
        let (_server, source) = rpc_with_result(json!({ "status": "0x0" })).await;
        assert_eq!(source.receipt_status("0xabc").await.unwrap(), ReceiptStatus::Reverted);
    }

    #[tokio::test]
    async fn test_rpc_receipt_empty_hash() {
        let source = RpcReceiptSource::new("http://localhost:8545", Duration::from_secs(1)).unwrap();
        assert!(source.receipt_status("").await.is_err());
    }
}
