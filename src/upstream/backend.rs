use super::BackendApi;
use crate::{
    error::{ApiError, AuthError},
    types::{AuthCredentials, Profile, RegisterRequest, TxRecord},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

/// Client for the wallet backend.
///
/// Sessions ride on an auth cookie issued at login, so the underlying HTTP client keeps a
/// cookie store and replays the cookie on every request.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    private_user_info: Profile,
}

#[derive(Debug, Deserialize)]
struct OccupiedResponse {
    occupied: bool,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(rename = "txHistory")]
    tx_history: Vec<TxRecord>,
}

impl BackendClient {
    /// Create a client for the backend at `base`.
    pub fn new(base: impl Into<String>) -> eyre::Result<Self> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self { client, base: base.into().trim_end_matches('/').to_string() })
    }

    async fn profile(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<Profile, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { status, endpoint: endpoint.to_string() });
        }
        let body = response.bytes().await?;
        let envelope: ProfileEnvelope = serde_json::from_slice(&body)
            .map_err(|source| ApiError::Decode { endpoint: endpoint.to_string(), source })?;
        Ok(envelope.private_user_info)
    }
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn me(&self) -> Result<Profile, AuthError> {
        let url = format!("{}/me", self.base);
        let response = self.client.get(&url).send().await.map_err(ApiError::from)?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AuthError::Unauthorized);
        }
        Ok(self.profile("/me", response).await?)
    }

    async fn login(&self, credentials: &AuthCredentials) -> Result<Profile, AuthError> {
        let url = format!("{}/auth", self.base);
        let response =
            self.client.post(&url).json(credentials).send().await.map_err(ApiError::from)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AuthError::UnknownAccount);
        }
        Ok(self.profile("/auth", response).await?)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<Profile, AuthError> {
        let url = format!("{}/auth/register", self.base);
        let response =
            self.client.post(&url).json(request).send().await.map_err(ApiError::from)?;
        if response.status() == StatusCode::CONFLICT {
            return Err(AuthError::NameTaken(request.wallet_name.clone()));
        }
        Ok(self.profile("/auth/register", response).await?)
    }

    async fn wallet_name_occupied(&self, name: &str) -> Result<bool, AuthError> {
        let url = format!("{}/auth/{name}", self.base);
        let response = self.client.get(&url).send().await.map_err(ApiError::from)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { status, endpoint: format!("/auth/{name}") }.into());
        }
        let body = response.bytes().await.map_err(ApiError::from)?;
        let decoded: OccupiedResponse = serde_json::from_slice(&body)
            .map_err(|source| ApiError::Decode { endpoint: format!("/auth/{name}"), source })?;
        Ok(decoded.occupied)
    }

    async fn logout(&self) -> Result<(), AuthError> {
        let url = format!("{}/auth/logout", self.base);
        let response = self.client.post(&url).send().await.map_err(ApiError::from)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { status, endpoint: "/auth/logout".to_string() }.into());
        }
        Ok(())
    }

    async fn tx_history(&self) -> Result<Vec<TxRecord>, ApiError> {
        let url = format!("{}/txHistory", self.base);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { status, endpoint: "/txHistory".to_string() });
        }
        let body = response.bytes().await?;
        let decoded: HistoryResponse = serde_json::from_slice(&body)
            .map_err(|source| ApiError::Decode { endpoint: "/txHistory".to_string(), source })?;
        Ok(decoded.tx_history)
    }
}
