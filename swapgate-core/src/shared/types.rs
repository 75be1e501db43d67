use serde::{Deserialize, Serialize};

// Basic types for swap operations
pub type Address = String;
pub type TransactionHash = String;
pub type ChainId = u64;
/// Integer amount in the token's smallest denomination, as a decimal string.
pub type BaseUnits = String;

/// Indicative, non-binding price returned by the aggregator.
///
/// Upstream bodies name the gas estimate `estimatedGas`, `gas`, or both;
/// `estimatedGas` wins when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "UpstreamPrice")]
pub struct SwapPrice {
    pub buy_amount: BaseUnits,
    pub sell_amount: BaseUnits,
    pub price: String,
    pub estimated_gas: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buy_token: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sell_token: Option<Address>,
}

/// Wire shape of a price body before the gas keys are merged.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpstreamPrice {
    buy_amount: BaseUnits,
    sell_amount: BaseUnits,
    #[serde(default)]
    price: String,
    #[serde(default)]
    estimated_gas: Option<String>,
    #[serde(default)]
    gas: Option<String>,
    #[serde(default)]
    gas_price: Option<String>,
    #[serde(default)]
    buy_token: Option<Address>,
    #[serde(default)]
    sell_token: Option<Address>,
}

impl From<UpstreamPrice> for SwapPrice {
    fn from(raw: UpstreamPrice) -> Self {
        let estimated_gas = raw
            .estimated_gas
            .filter(|g| !g.is_empty())
            .or(raw.gas)
            .unwrap_or_default();
        Self {
            buy_amount: raw.buy_amount,
            sell_amount: raw.sell_amount,
            price: raw.price,
            estimated_gas,
            gas_price: raw.gas_price,
            buy_token: raw.buy_token,
            sell_token: raw.sell_token,
        }
    }
}

/// Allowance shortfall reported by the aggregator on a firm quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceIssue {
    pub actual: BaseUnits,
    pub spender: Address,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteIssues {
    #[serde(default)]
    pub allowance: Option<AllowanceIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<serde_json::Value>,
}

/// Firm, executable quote. Consumed at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    #[serde(flatten)]
    pub price: SwapPrice,
    pub to: Address,
    pub data: String,
    #[serde(default = "zero_value")]
    pub value: BaseUnits,
    #[serde(default)]
    pub allowance_target: Address,
    #[serde(default)]
    pub issues: Option<QuoteIssues>,
}

fn zero_value() -> BaseUnits {
    "0".to_string()
}

impl SwapQuote {
    pub fn allowance_issue(&self) -> Option<&AllowanceIssue> {
        self.issues.as_ref().and_then(|issues| issues.allowance.as_ref())
    }
}

/// Which side of the trade the caller fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwapAmount {
    Sell(BaseUnits),
    Buy(BaseUnits),
}

impl SwapAmount {
    pub fn query_key(&self) -> &'static str {
        match self {
            SwapAmount::Sell(_) => "sellAmount",
            SwapAmount::Buy(_) => "buyAmount",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            SwapAmount::Sell(v) | SwapAmount::Buy(v) => v,
        }
    }
}

/// Parameters shared by price and quote requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapParams {
    pub chain_id: ChainId,
    pub sell_token: Address,
    pub buy_token: Address,
    pub amount: SwapAmount,
    pub taker: Address,
    pub slippage_bps: Option<u32>,
}

/// Transaction handed to the signer for submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub chain_id: ChainId,
    pub to: Address,
    pub data: String,
    pub value: BaseUnits,
    pub gas: Option<String>,
}

impl From<&SwapQuote> for TransactionRequest {
    fn from(quote: &SwapQuote) -> Self {
        let gas = Some(quote.price.estimated_gas.clone()).filter(|g| !g.is_empty());
        Self {
            chain_id: 0,
            to: quote.to.clone(),
            data: quote.data.clone(),
            value: quote.value.clone(),
            gas,
        }
    }
}

/// Outcome of a receipt lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Pending,
    Confirmed,
    Reverted,
}

/// Connected wallet as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletContext {
    pub address: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub is_connected: bool,
}

impl WalletContext {
    pub fn connected(address: impl Into<Address>, chain_id: ChainId) -> Self {
        Self {
            address: Some(address.into()),
            chain_id: Some(chain_id),
            is_connected: true,
        }
    }
}
