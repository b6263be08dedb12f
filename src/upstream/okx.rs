use super::{PriceFeed, SwapApi, parse_u256};
use crate::{
    error::{ApiError, SwapError},
    types::{ActionStep, GasBreakdown, SwapRequest, Token},
};
use alloy::primitives::{Address, B256, ChainId, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Envelope code signalling success.
const OK_CODE: &str = "0";

/// Envelope code signalling that the pair cannot be filled at any size.
const INSUFFICIENT_LIQUIDITY_CODE: &str = "82000";

/// Client for the OKX DEX aggregator.
///
/// Every response arrives wrapped in a `{code, msg, data}` envelope where `data` is a
/// single-element array and application errors are reported through `code` on an HTTP 200.
#[derive(Debug, Clone)]
pub struct OkxDexClient {
    client: reqwest::Client,
    base: String,
    chain_id: ChainId,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: String,
    #[serde(default)]
    msg: String,
    data: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteData {
    to_token_amount: String,
}

#[derive(Debug, Deserialize)]
struct PriceData {
    price: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GasData {
    total_gas: String,
    #[serde(default)]
    actions: Vec<ActionStep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitData {
    user_op_hash: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapPayload<'a> {
    chain_id: ChainId,
    user_wallet_address: Address,
    from_token_address: Address,
    to_token_address: Address,
    amount: String,
    slippage: &'a str,
}

impl<'a> SwapPayload<'a> {
    fn new(chain_id: ChainId, request: &'a SwapRequest) -> Self {
        Self {
            chain_id,
            user_wallet_address: request.sender,
            from_token_address: request.from_token.address,
            to_token_address: request.to_token.address,
            amount: request.amount.to_string(),
            slippage: &request.slippage,
        }
    }
}

impl OkxDexClient {
    /// Create a client for the aggregator at `base`, quoting on `chain_id`.
    pub fn new(base: impl Into<String>, chain_id: ChainId) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
            chain_id,
        }
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<Envelope<T>, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { status, endpoint: endpoint.to_string() });
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|source| ApiError::Decode { endpoint: endpoint.to_string(), source })
    }

    /// Unwraps an envelope into its first data element.
    fn ok_data<T>(endpoint: &str, envelope: Envelope<T>) -> Result<T, ApiError> {
        if envelope.code != OK_CODE {
            return Err(ApiError::Upstream { code: envelope.code, message: envelope.msg });
        }
        envelope
            .data
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| ApiError::MissingData { endpoint: endpoint.to_string() })
    }

    /// [`Self::ok_data`] with the liquidity code mapped to its own error.
    fn swap_data<T>(endpoint: &str, envelope: Envelope<T>) -> Result<T, SwapError> {
        if envelope.code == INSUFFICIENT_LIQUIDITY_CODE {
            return Err(SwapError::InsufficientLiquidity);
        }
        Ok(Self::ok_data(endpoint, envelope)?)
    }
}

#[async_trait]
impl SwapApi for OkxDexClient {
    async fn swap_quote(
        &self,
        from: &Token,
        to: &Token,
        amount: U256,
        slippage: &str,
    ) -> Result<U256, SwapError> {
        let url = format!("{}/aggregator/quote", self.base);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("chainId", self.chain_id.to_string()),
                ("fromTokenAddress", from.address.to_string()),
                ("toTokenAddress", to.address.to_string()),
                ("amount", amount.to_string()),
                ("slippage", slippage.to_string()),
            ])
            .send()
            .await
            .map_err(ApiError::from)?;

        let envelope: Envelope<QuoteData> = self.decode("/aggregator/quote", response).await?;
        let data = Self::swap_data("/aggregator/quote", envelope)?;
        Ok(parse_u256(&data.to_token_amount, "toTokenAmount")?)
    }

    async fn estimate_gas(&self, request: &SwapRequest) -> Result<GasBreakdown, SwapError> {
        let url = format!("{}/aggregator/swap-estimate", self.base);
        let response = self
            .client
            .post(&url)
            .json(&SwapPayload::new(self.chain_id, request))
            .send()
            .await
            .map_err(ApiError::from)?;

        let envelope: Envelope<GasData> = self.decode("/aggregator/swap-estimate", response).await?;
        let data = Self::swap_data("/aggregator/swap-estimate", envelope)?;
        Ok(GasBreakdown {
            total_gas: parse_u256(&data.total_gas, "totalGas")?,
            actions: data.actions,
        })
    }

    async fn submit(&self, request: &SwapRequest) -> Result<B256, SwapError> {
        let url = format!("{}/aggregator/swap", self.base);
        let response = self
            .client
            .post(&url)
            .json(&SwapPayload::new(self.chain_id, request))
            .send()
            .await
            .map_err(ApiError::from)?;

        let envelope: Envelope<SubmitData> = self.decode("/aggregator/swap", response).await?;
        let data = Self::swap_data("/aggregator/swap", envelope)?;
        if data.user_op_hash.trim().is_empty() {
            return Err(SwapError::EmptyHandle);
        }
        let hash: B256 = match data.user_op_hash.parse() {
            Ok(hash) => hash,
            Err(_) => {
                return Err(
                    ApiError::Number { field: "userOpHash", value: data.user_op_hash }.into()
                );
            }
        };
        if hash.is_zero() {
            return Err(SwapError::EmptyHandle);
        }
        Ok(hash)
    }
}

#[async_trait]
impl PriceFeed for OkxDexClient {
    async fn usd_price(&self, token: Address) -> Result<f64, ApiError> {
        let url = format!("{}/market/price", self.base);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("chainId", self.chain_id.to_string()),
                ("tokenContractAddress", token.to_string()),
            ])
            .send()
            .await?;

        let envelope: Envelope<PriceData> = self.decode("/market/price", response).await?;
        let data = Self::ok_data("/market/price", envelope)?;
        data.price.parse().map_err(|_| ApiError::Number { field: "price", value: data.price.clone() })
    }
}
