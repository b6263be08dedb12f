//! Clients for the services the wallet depends on.

use crate::{
    error::{ApiError, AuthError, OpError, SwapError},
    types::{
        AuthCredentials, GasBreakdown, OpPoll, Profile, RegisterRequest, SwapRequest, Token,
        TxRecord,
    },
};
use alloy::primitives::{Address, B256, ChainId, U256};
use async_trait::async_trait;

mod backend;
pub use backend::BackendClient;

mod bundler;
pub use bundler::BundlerClient;

mod chain;
pub use chain::ChainReader;

mod okx;
pub use okx::OkxDexClient;

/// Source of quotes, gas estimates and swap execution.
#[async_trait]
pub trait SwapApi: Send + Sync {
    /// Returns the amount of `to` received for selling `amount` base units of `from`, in base
    /// units of `to`.
    async fn swap_quote(
        &self,
        from: &Token,
        to: &Token,
        amount: U256,
        slippage: &str,
    ) -> Result<U256, SwapError>;

    /// Estimates the gas cost of executing `request`.
    async fn estimate_gas(&self, request: &SwapRequest) -> Result<GasBreakdown, SwapError>;

    /// Submits `request` for execution, returning the operation hash.
    async fn submit(&self, request: &SwapRequest) -> Result<B256, SwapError>;
}

/// Source of USD prices for tokens.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Returns the USD price of one whole token.
    async fn usd_price(&self, token: Address) -> Result<f64, ApiError>;
}

/// The bundler tracking submitted operations.
#[async_trait]
pub trait BundlerApi: Send + Sync {
    /// Returns the current lifecycle state of a submitted operation.
    async fn op_receipt(&self, op_hash: B256) -> Result<OpPoll, OpError>;

    /// Returns the chain the bundler settles on.
    async fn chain_id(&self) -> Result<ChainId, OpError>;
}

/// Reader of on-chain token balances.
#[async_trait]
pub trait BalanceReader: Send + Sync {
    /// Returns the balance of `account` in whole units of `token`.
    async fn token_balance(&self, account: Address, token: &Token) -> Result<f64, ApiError>;
}

/// The wallet backend holding profiles and swap history.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Returns the profile bound to the current session cookie.
    async fn me(&self) -> Result<Profile, AuthError>;

    /// Exchanges provider credentials for a session cookie.
    async fn login(&self, credentials: &AuthCredentials) -> Result<Profile, AuthError>;

    /// Registers a new account and opens a session for it.
    async fn register(&self, request: &RegisterRequest) -> Result<Profile, AuthError>;

    /// Returns whether a wallet name is already registered.
    async fn wallet_name_occupied(&self, name: &str) -> Result<bool, AuthError>;

    /// Closes the current session.
    async fn logout(&self) -> Result<(), AuthError>;

    /// Returns the account's swap history.
    async fn tx_history(&self) -> Result<Vec<TxRecord>, ApiError>;
}

/// Parses a numeric string that may be `0x`-prefixed hex or plain decimal.
pub(crate) fn parse_u256(value: &str, field: &'static str) -> Result<U256, ApiError> {
    let parsed = if let Some(hex) = value.strip_prefix("0x") {
        U256::from_str_radix(hex, 16)
    } else {
        U256::from_str_radix(value, 10)
    };
    parsed.map_err(|_| ApiError::Number { field, value: value.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_strings() {
        assert_eq!(parse_u256("1500000", "amount").unwrap(), U256::from(1_500_000u64));
        assert_eq!(parse_u256("0xff", "amount").unwrap(), U256::from(255u64));
        assert!(parse_u256("12.5", "amount").is_err());
        assert!(parse_u256("", "amount").is_err());
    }
}
