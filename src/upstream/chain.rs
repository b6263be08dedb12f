use super::BalanceReader;
use crate::{
    error::ApiError,
    types::{IERC20, Token, format_amount},
};
use alloy::{
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
};
use async_trait::async_trait;
use url::Url;

/// On-chain reader backed by a JSON-RPC provider.
#[derive(Debug, Clone)]
pub struct ChainReader {
    provider: DynProvider,
}

impl ChainReader {
    /// Create a reader for the node at `rpc_url`.
    pub fn new(rpc_url: Url) -> Self {
        Self { provider: ProviderBuilder::new().connect_http(rpc_url).erased() }
    }
}

#[async_trait]
impl BalanceReader for ChainReader {
    async fn token_balance(&self, account: Address, token: &Token) -> Result<f64, ApiError> {
        let raw = IERC20::new(token.address, &self.provider).balanceOf(account).call().await?;
        let formatted = format_amount(raw, token.decimals);
        formatted.parse().map_err(|_| ApiError::Number { field: "balance", value: formatted })
    }
}
