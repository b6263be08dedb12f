//! Wallet error types.
use thiserror::Error;

mod api;
pub use api::ApiError;

mod auth;
pub use auth::AuthError;

mod op;
pub use op::OpError;

mod swap;
pub use swap::SwapError;

/// The overarching error type returned by wallet operations.
#[derive(Debug, Error)]
pub enum WalletError {
    /// Errors related to authentication and accounts.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Errors related to the swap workflow.
    #[error(transparent)]
    Swap(#[from] SwapError),
    /// Errors related to submitted operations.
    #[error(transparent)]
    Op(#[from] OpError),
    /// Errors related to upstream HTTP services.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// An internal error occurred.
    #[error(transparent)]
    InternalError(#[from] eyre::Error),
}

macro_rules! impl_error_helpers {
    ($err:ty) => {
        impl From<$err> for String {
            fn from(err: $err) -> Self {
                err.to_string()
            }
        }
    };
}

impl_error_helpers!(WalletError);
impl_error_helpers!(ApiError);
impl_error_helpers!(AuthError);
impl_error_helpers!(OpError);
impl_error_helpers!(SwapError);
