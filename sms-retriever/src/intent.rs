//! Raw retriever broadcasts as the platform hands them over.
//!
//! Every field the platform might omit is optional here; turning an
//! incomplete broadcast into an error notification is the decoder's job.

/// Status code reported when a message was retrieved
pub const STATUS_SUCCESS: i32 = 0;

/// Status code reported when the retrieval window elapsed
pub const STATUS_TIMEOUT: i32 = 15;

/// Status object attached to a retriever broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: i32,
    pub message: Option<String>,
}

impl Status {
    pub fn new(code: i32) -> Self {
        Self {
            code,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// What reading the status extra produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusExtra {
    Present(Status),
    Missing,
    /// The extra was there but could not be read
    Unreadable(String),
}

/// Extras bundle of a retriever broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentExtras {
    pub status: StatusExtra,
    pub message: Option<String>,
}

/// One broadcast delivered by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieverIntent {
    pub action: String,
    pub extras: Option<IntentExtras>,
}

impl RetrieverIntent {
    /// A successful retrieval carrying `message`
    pub fn retrieved(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            extras: Some(IntentExtras {
                status: StatusExtra::Present(Status::new(STATUS_SUCCESS)),
                message: Some(message.into()),
            }),
        }
    }

    /// The broker's retrieval window elapsed
    pub fn timed_out(action: impl Into<String>) -> Self {
        Self::with_status(action, Status::new(STATUS_TIMEOUT))
    }

    /// Any other status
    pub fn with_status(action: impl Into<String>, status: Status) -> Self {
        Self {
            action: action.into(),
            extras: Some(IntentExtras {
                status: StatusExtra::Present(status),
                message: None,
            }),
        }
    }

    /// A broadcast with no extras bundle
    pub fn without_extras(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            extras: None,
        }
    }
}
