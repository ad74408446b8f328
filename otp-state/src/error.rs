//! Error types for otp-state

use otp_event_manager::StartError;

/// Errors surfaced by the listener and app hash adapters
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListenerError {
    /// The listening session could not be started
    #[error(transparent)]
    Start(#[from] StartError),

    /// The signature provider produced no hash
    #[error("No app hash found")]
    NoAppHash,
}

/// Result type for otp-state operations
pub type Result<T> = std::result::Result<T, ListenerError>;
