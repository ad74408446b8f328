//! Event types for the sms-retriever crate.
//!
//! An [`SmsEvent`] is the normalized outcome of one retriever broadcast. Each
//! variant wraps the payload sent on one of the three notification channels.

use serde::{Deserialize, Serialize};

/// Message carried by every timeout notification
pub const TIMEOUT_MESSAGE: &str = "SMS retrieval timed out";

/// Payload of `onSmsReceived`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsReceivedPayload {
    /// Full SMS body
    pub message: String,
    /// Extracted code; `None` when the message held no recognizable OTP
    pub otp: Option<String>,
}

/// Payload of `onTimeout`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutPayload {
    pub message: String,
}

impl Default for TimeoutPayload {
    fn default() -> Self {
        Self {
            message: TIMEOUT_MESSAGE.to_string(),
        }
    }
}

/// Payload of `onError`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub message: String,
    pub code: i32,
}

/// Notification channels exposed to application code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventChannel {
    SmsReceived,
    Timeout,
    Error,
}

impl EventChannel {
    /// Channel name as seen by the application bridge
    pub fn name(&self) -> &'static str {
        match self {
            EventChannel::SmsReceived => "onSmsReceived",
            EventChannel::Timeout => "onTimeout",
            EventChannel::Error => "onError",
        }
    }
}

/// Terminal outcome of a retrieval session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SmsEvent {
    Received(SmsReceivedPayload),
    Timeout(TimeoutPayload),
    Error(ErrorPayload),
}

impl SmsEvent {
    pub fn received(message: impl Into<String>, otp: Option<String>) -> Self {
        SmsEvent::Received(SmsReceivedPayload {
            message: message.into(),
            otp,
        })
    }

    pub fn timeout() -> Self {
        SmsEvent::Timeout(TimeoutPayload::default())
    }

    pub fn error(message: impl Into<String>, code: i32) -> Self {
        SmsEvent::Error(ErrorPayload {
            message: message.into(),
            code,
        })
    }

    /// Channel this event is published on
    pub fn channel(&self) -> EventChannel {
        match self {
            SmsEvent::Received(_) => EventChannel::SmsReceived,
            SmsEvent::Timeout(_) => EventChannel::Timeout,
            SmsEvent::Error(_) => EventChannel::Error,
        }
    }

    /// The extracted OTP, if this is a received event that carried one
    pub fn otp(&self) -> Option<&str> {
        match self {
            SmsEvent::Received(payload) => payload.otp.as_deref(),
            _ => None,
        }
    }
}
