use super::ApiError;
use thiserror::Error;

/// Errors related to submitted operations.
#[derive(Debug, Error)]
pub enum OpError {
    /// The bundler answered with a JSON-RPC error object.
    #[error("bundler error {code}: {message}")]
    Rpc {
        /// The JSON-RPC error code.
        code: i64,
        /// The accompanying message.
        message: String,
    },
    /// The bundler response carried neither a result nor an error.
    #[error("bundler response missing result")]
    MissingResult,
    /// The bundler request failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}
