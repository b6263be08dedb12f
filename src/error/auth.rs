use super::ApiError;
use crate::constants::{WALLET_NAME_MAX_LEN, WALLET_NAME_MIN_LEN};
use thiserror::Error;

/// Errors related to authentication and accounts.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No valid session cookie is present.
    #[error("not authenticated")]
    Unauthorized,
    /// The credentials do not map to a registered account.
    #[error("no account registered for these credentials")]
    UnknownAccount,
    /// The requested wallet name is already registered.
    #[error("wallet name already taken: {0}")]
    NameTaken(String),
    /// The wallet name does not satisfy the naming rules.
    #[error(
        "invalid wallet name: must be {WALLET_NAME_MIN_LEN}-{WALLET_NAME_MAX_LEN} characters \
         from [A-Za-z0-9_.-]"
    )]
    InvalidName,
    /// The backend request failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}
