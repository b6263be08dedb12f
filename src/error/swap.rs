use super::ApiError;
use thiserror::Error;

/// Errors related to the swap workflow.
#[derive(Debug, Error)]
pub enum SwapError {
    /// The source and destination tokens are the same.
    #[error("cannot swap a token for itself")]
    IdenticalTokens,
    /// The entered amount is empty or not a positive decimal number.
    #[error("invalid swap amount")]
    InvalidAmount,
    /// The entered amount has more fractional digits than the token supports.
    #[error("amount exceeds token precision of {0} decimals")]
    AmountPrecision(u8),
    /// No exchange rate is available for the selected pair.
    #[error("no quote available for the selected pair")]
    QuoteUnavailable,
    /// A quote refresh is still in flight.
    #[error("quote refresh in progress")]
    QuoteRefreshing,
    /// The aggregator cannot fill the pair at any size.
    #[error("insufficient liquidity for the selected pair")]
    InsufficientLiquidity,
    /// The gas estimate is older than its validity window.
    #[error("gas estimate expired")]
    EstimateExpired,
    /// A gas estimate is already being computed.
    #[error("gas estimation in progress")]
    EstimateInFlight,
    /// An operation from this session is still being tracked.
    #[error("an operation is already in flight")]
    OpInFlight,
    /// The action is not valid in the current workflow stage.
    #[error("swap is not ready for this action")]
    NotReady,
    /// The aggregator accepted the swap but returned no operation handle.
    #[error("swap submission returned no operation handle")]
    EmptyHandle,
    /// The swap service has shut down.
    #[error("swap service stopped")]
    ServiceStopped,
    /// The aggregator request failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}
