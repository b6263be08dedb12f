use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user's profile as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// The unique wallet name.
    pub wallet_name: String,
    /// The smart account address controlled by this profile.
    pub account_address: Address,
    /// URL of the profile image, if one is set.
    #[serde(default)]
    pub profile_image_url: Option<String>,
    /// The external identity provider, e.g. `google`.
    pub auth_provider: String,
    /// The identity assigned by the provider.
    pub auth_external_id: String,
    /// When the profile last logged in.
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    /// When the profile was registered.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Credentials obtained from an external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCredentials {
    /// The identity provider, e.g. `google`.
    #[serde(rename = "auth_provider")]
    pub provider: String,
    /// The identity assigned by the provider.
    #[serde(rename = "auth_external_id")]
    pub external_id: String,
}

impl AuthCredentials {
    /// Create a new instance of [`Self`].
    pub fn new(provider: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self { provider: provider.into(), external_id: external_id.into() }
    }
}

/// Payload for registering a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// The identity provider.
    pub auth_provider: String,
    /// The identity assigned by the provider.
    pub auth_external_id: String,
    /// The requested wallet name.
    pub wallet_name: String,
    /// URL of the profile image, if one is set.
    #[serde(default)]
    pub profile_image_url: Option<String>,
}
