use alloy::{
    primitives::{Address, B256, Bloom, Bytes, U256},
    rpc::types::Log,
};
use serde::{Deserialize, Serialize};

/// Lifecycle of a submitted operation as reported by the bundler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpState {
    /// Accepted by the bundler, not yet included in a bundle.
    Pending,
    /// Included in a bundle awaiting inclusion on chain.
    Bundled,
    /// Landed on chain.
    Sent,
}

/// One poll of the bundler for a tracked operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpPoll {
    /// The tracked operation hash.
    pub op_hash: B256,
    /// The reported lifecycle state.
    pub state: OpState,
    /// The receipt, present once the operation is [`OpState::Sent`].
    #[serde(default)]
    pub receipt: Option<UserOperationReceipt>,
}

/// The receipt of a landed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    /// The operation hash.
    pub user_op_hash: B256,
    /// The account the operation executed for.
    #[serde(with = "crate::serde::topic_address")]
    pub sender: Address,
    /// The operation nonce.
    pub nonce: U256,
    /// The raw paymaster-and-data blob, empty when the operation was unsponsored.
    #[serde(default)]
    pub paymaster: Option<Bytes>,
    /// Whether the operation executed successfully.
    pub success: bool,
    /// The gas cost actually charged, in native wei.
    pub actual_gas_cost: U256,
    /// The gas actually consumed.
    pub actual_gas_used: U256,
    /// The enclosing transaction receipt, when the bundler reports one.
    #[serde(default)]
    pub receipt: Option<OpTransactionReceipt>,
}

/// The on-chain transaction receipt enclosing a landed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpTransactionReceipt {
    /// Hash of the enclosing transaction.
    pub transaction_hash: B256,
    /// Hash of the including block.
    pub block_hash: B256,
    /// Number of the including block.
    pub block_number: U256,
    /// Gas used by the transaction.
    pub gas_used: U256,
    /// Cumulative gas used in the block up to this transaction.
    pub cumulative_gas_used: U256,
    /// Effective gas price paid.
    pub effective_gas_price: U256,
    /// Logs emitted by the transaction.
    #[serde(default)]
    pub logs: Vec<Log>,
    /// Bloom filter over the emitted logs.
    #[serde(default)]
    pub logs_bloom: Bloom,
}
