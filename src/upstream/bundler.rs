use super::BundlerApi;
use crate::{
    error::{ApiError, OpError},
    types::OpPoll,
};
use alloy::primitives::{B256, ChainId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// JSON-RPC client for the bundler.
#[derive(Debug, Clone)]
pub struct BundlerClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Serialize)]
struct RpcRequest<P> {
    jsonrpc: &'static str,
    method: &'static str,
    params: P,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl BundlerClient {
    /// Create a client for the bundler at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into() }
    }

    /// Performs a JSON-RPC call against the bundler.
    ///
    /// The bundler reports operations that have not landed yet with a non-2xx status and a
    /// regular result body, so the body is decoded before the status is considered.
    async fn call<P: Serialize + Send, T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<T, OpError> {
        let request = RpcRequest { jsonrpc: "2.0", method, params, id: 1 };
        let response =
            self.client.post(&self.url).json(&request).send().await.map_err(ApiError::from)?;
        let status = response.status();
        let body = response.bytes().await.map_err(ApiError::from)?;

        let decoded: RpcResponse<T> = match serde_json::from_slice(&body) {
            Ok(decoded) => decoded,
            Err(source) => {
                if !status.is_success() {
                    return Err(ApiError::Status { status, endpoint: method.to_string() }.into());
                }
                return Err(ApiError::Decode { endpoint: method.to_string(), source }.into());
            }
        };
        if let Some(error) = decoded.error {
            return Err(OpError::Rpc { code: error.code, message: error.message });
        }
        decoded.result.ok_or(OpError::MissingResult)
    }
}

#[async_trait]
impl BundlerApi for BundlerClient {
    async fn op_receipt(&self, op_hash: B256) -> Result<OpPoll, OpError> {
        self.call("eth_getUserOperationReceipt", [op_hash]).await
    }

    async fn chain_id(&self) -> Result<ChainId, OpError> {
        let hex: String = self.call("eth_chainId", [(); 0]).await?;
        let digits = hex.strip_prefix("0x").unwrap_or(&hex);
        let chain = u64::from_str_radix(digits, 16)
            .map_err(|_| ApiError::Number { field: "chainId", value: hex.clone() })?;
        Ok(chain)
    }
}
