//! Error types for the sms-retriever crate.

/// Errors returned by the broker when a retrieval cannot be started.
///
/// These are the only failures the listener retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerStartError {
    /// The broker refused the start request
    #[error("Failed to start SMS retriever: {0}")]
    Rejected(String),

    /// The broker service is not reachable right now
    #[error("SMS retriever service unavailable: {0}")]
    Unavailable(String),

    /// The platform has no SMS retriever at all
    #[error("SMS retriever is not supported on this platform")]
    Unsupported,
}

/// Invalid retriever configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Max start attempts must be greater than 0")]
    NoAttempts,

    #[error("Invalid backoff: base {base_ms}ms must not exceed max {max_ms}ms")]
    InvalidBackoff { base_ms: u128, max_ms: u128 },

    #[error("Retrieval window must be greater than 0")]
    EmptyWindow,

    #[error("Broadcast action must not be empty")]
    EmptyAction,
}

/// Errors from reading the app's signing certificates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The package manager lookup failed
    #[error("Failed to read signing certificates: {0}")]
    Unavailable(String),
}
