use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors surfaced to the caller as `Err`.
///
/// Only caller-contract violations land here. Transport faults and malformed
/// provider responses are normalized into failure-classified
/// [`PaymentOutcome`](crate::types::PaymentOutcome) values instead, so a
/// network problem can never terminate the calling task.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    #[error("Operation '{operation}' is not supported by provider '{provider}'")]
    UnsupportedOperation { provider: String, operation: String },
}
