//! # OTP Autofill - SMS one-time passcode autofill
//!
//! Starts a short-lived SMS retriever session, pulls the one-time passcode
//! out of the delivered message and hands it to application code:
//!
//! ```rust,ignore
//! use otp_autofill::{OtpAutofill, StaticSignatures};
//!
//! let autofill = OtpAutofill::new(broker, StaticSignatures::new(package, certificates));
//!
//! // Give this to the SMS sender; it must end the message
//! let hash = autofill.get_hash()?.remove(0);
//!
//! let _subscription = autofill.on_sms_received(|payload| {
//!     if let Some(otp) = &payload.otp {
//!         println!("OTP: {otp}");
//!     }
//! });
//! autofill.start_otp_listener().await?;
//!
//! // Platform glue forwards the retriever broadcast
//! autofill.deliver_broadcast(intent);
//! ```
//!
//! ## Key Features
//!
//! - **One session at a time**: a second start while listening is rejected
//! - **Retries**: refused broker starts back off exponentially
//! - **Exactly one outcome**: each session ends in one of `onSmsReceived`,
//!   `onTimeout` or `onError`, then releases its receivers
//! - **Three API styles**: channel listeners on [`OtpAutofill`], the
//!   handler-based [`OtpVerify`], and the reactive [`OtpListener`] /
//!   [`AppHash`]
//!
//! ## Architecture
//!
//! ```text
//! otp-autofill (facade, bridge JSON)
//!     ↓
//! otp-state (reactive listener, app hash, logging)
//!     ↓
//! otp-event-manager (session lifecycle, event fan-out)
//!     ↓
//! sms-retriever (broker boundary, broadcast decoding, signature hash)
//!     ↓
//! otp-parser (OTP extraction)
//! ```

pub use autofill::{OtpAutofill, STOPPED_MESSAGE};
pub use bridge::BridgeEvent;
pub use error::SdkError;
pub use verify::{OtpSubscription, OtpVerify};

// Re-export the types applications touch from the lower layers
pub use otp_event_manager::{EventSubscription, SessionState, StartError, Started};
pub use otp_parser::{extract, find_otp, OtpExtractor, OtpExtractorBuilder, OtpMatch, Provenance};
pub use otp_state::{
    logging, AppHash, HashOptions, HashSnapshot, ListenerOptions, ListenerSnapshot, OtpListener,
};
pub use sms_retriever::{
    BroadcastRouter, BrokerStartError, ErrorPayload, EventChannel, RetrieverConfig,
    RetrieverIntent, SignatureProvider, SmsBroker, SmsEvent, SmsReceivedPayload,
    StaticSignatures, TimeoutPayload, UnsupportedBroker, SMS_RETRIEVED_ACTION,
};

#[cfg(feature = "test-support")]
pub use sms_retriever::mock;

mod autofill;
mod bridge;
mod error;
mod verify;
