use crate::types::Token;
use alloy::primitives::{Address, U256};

/// A fully validated swap, ready for gas estimation or submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    /// The account performing the swap.
    pub sender: Address,
    /// The token being sold.
    pub from_token: Token,
    /// The token being bought.
    pub to_token: Token,
    /// The amount sold, in base units of `from_token`.
    pub amount: U256,
    /// Maximum acceptable slippage as a decimal fraction, e.g. `"0.005"`.
    pub slippage: String,
}
