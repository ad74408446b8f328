//! Turns a raw retriever broadcast into exactly one [`SmsEvent`].
//!
//! Malformed broadcasts never fail the caller: each defect maps to an
//! [`SmsEvent::Error`] with its own code.

use tracing::{debug, error, warn};

use crate::event::SmsEvent;
use crate::intent::{RetrieverIntent, StatusExtra, STATUS_SUCCESS, STATUS_TIMEOUT};

/// The broadcast had no extras bundle
pub const ERROR_NULL_EXTRAS: i32 = -1001;

/// The extras had no status object
pub const ERROR_NULL_STATUS: i32 = -1002;

/// The status object could not be read
pub const ERROR_STATUS_PARSING: i32 = -1003;

/// A success status without a usable message body
pub const ERROR_NULL_MESSAGE: i32 = -1004;

/// Decode one broadcast, extracting the OTP on success
pub fn decode(intent: &RetrieverIntent) -> SmsEvent {
    let Some(extras) = intent.extras.as_ref() else {
        error!("Retriever broadcast has no extras");
        return SmsEvent::error("Intent extras are null", ERROR_NULL_EXTRAS);
    };

    let status = match &extras.status {
        StatusExtra::Present(status) => status,
        StatusExtra::Unreadable(reason) => {
            error!("Error getting status from retriever broadcast: {}", reason);
            return SmsEvent::error(
                format!("Error getting status: {reason}"),
                ERROR_STATUS_PARSING,
            );
        }
        StatusExtra::Missing => {
            error!("Retriever broadcast status is null");
            return SmsEvent::error("Status is null", ERROR_NULL_STATUS);
        }
    };

    debug!("SMS retriever status: {}", status.code);

    match status.code {
        STATUS_SUCCESS => decode_message(extras.message.as_deref()),
        STATUS_TIMEOUT => {
            debug!("SMS retriever timed out");
            SmsEvent::timeout()
        }
        code => {
            // A status without a message renders as "null", matching the native bridge
            let detail = status.message.as_deref().unwrap_or("null");
            error!("SMS retriever error: {} (code: {})", detail, code);
            SmsEvent::error(format!("SMS retriever error: {detail}"), code)
        }
    }
}

fn decode_message(message: Option<&str>) -> SmsEvent {
    let Some(message) = message.filter(|m| !m.trim().is_empty()) else {
        error!("Retrieved SMS message is null or empty");
        return SmsEvent::error("SMS message is null or empty", ERROR_NULL_MESSAGE);
    };

    let found = otp_parser::find_otp(message);
    match &found {
        Some(m) => debug!("Found OTP {} ({:?})", m.code, m.provenance),
        None => warn!("No OTP found in retrieved message"),
    }

    SmsEvent::received(message, found.map(|m| m.code))
}
