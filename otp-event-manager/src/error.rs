use sms_retriever::BrokerStartError;
use thiserror::Error;

use crate::session::SessionState;

/// Errors from starting a listening session
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StartError {
    /// A session is already starting or listening
    #[error("SMS listener already active ({state:?})")]
    AlreadyActive { state: SessionState },

    /// Every start attempt was rejected by the broker
    #[error("Failed to start SMS retriever after {attempts} attempt(s): {last_cause}")]
    Exhausted {
        attempts: u32,
        #[source]
        last_cause: BrokerStartError,
    },

    /// `stop` was called before the broker acknowledged
    #[error("SMS listener was stopped while starting")]
    Cancelled,
}

impl StartError {
    /// Broker failure behind an exhausted start
    pub fn last_cause(&self) -> Option<&BrokerStartError> {
        match self {
            StartError::Exhausted { last_cause, .. } => Some(last_cause),
            _ => None,
        }
    }
}

/// Result type for start operations
pub type StartResult<T> = std::result::Result<T, StartError>;
