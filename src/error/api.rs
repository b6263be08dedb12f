use reqwest::StatusCode;
use thiserror::Error;

/// Errors arising from upstream HTTP services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response body could not be read.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// The service answered with an unexpected status code.
    #[error("unexpected status {status} from {endpoint}")]
    Status {
        /// The status code returned.
        status: StatusCode,
        /// The endpoint that was called.
        endpoint: String,
    },
    /// The service answered with an application-level error code.
    #[error("upstream error {code}: {message}")]
    Upstream {
        /// The error code reported by the service.
        code: String,
        /// The accompanying message.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to decode response from {endpoint}")]
    Decode {
        /// The endpoint that was called.
        endpoint: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// A numeric field in the response could not be parsed.
    #[error("invalid numeric value for {field}: {value}")]
    Number {
        /// The field that failed to parse.
        field: &'static str,
        /// The raw value received.
        value: String,
    },
    /// The response was well-formed but carried no data.
    #[error("missing data in response from {endpoint}")]
    MissingData {
        /// The endpoint that was called.
        endpoint: String,
    },
    /// An on-chain contract call failed.
    #[error(transparent)]
    Contract(#[from] alloy::contract::Error),
}
