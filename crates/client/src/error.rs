use thiserror::Error;

/// Failures that cannot be expressed as a `success: false` envelope.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    /// A newer identical request replaced this one while it was in flight.
    #[error("request cancelled by a newer identical request")]
    Cancelled,
    #[error("client setup failed: {0}")]
    Setup(String),
}
