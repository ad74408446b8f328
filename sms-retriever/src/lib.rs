//! # sms-retriever
//!
//! The boundary between otp-autofill and the platform SMS retriever.
//!
//! - [`SmsBroker`]: starts a retrieval; resolves on the broker's acknowledgement.
//! - [`BroadcastRouter`]: receivers registered against the retriever action get
//!   the one-shot result broadcast.
//! - [`decode`]: turns a raw [`RetrieverIntent`] into exactly one [`SmsEvent`],
//!   running OTP extraction on success.
//! - [`app_hash`] / [`compute_app_hashes`]: the 11-character hash the SMS sender
//!   appends so the broker routes the message to this app.
//!
//! ```text
//! start_retrieval() ──► Ack
//!        ⋮ (later, on the platform's thread)
//! RetrieverIntent ──► BroadcastRouter::dispatch ──► receiver ──► decode ──► SmsEvent
//! ```

mod broker;
mod config;
mod decoder;
mod error;
mod event;
mod intent;
mod router;
mod signature;

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

pub use broker::{Ack, SmsBroker, UnsupportedBroker};
pub use config::{RetrieverConfig, SMS_RETRIEVED_ACTION};
pub use decoder::{
    decode, ERROR_NULL_EXTRAS, ERROR_NULL_MESSAGE, ERROR_NULL_STATUS, ERROR_STATUS_PARSING,
};
pub use error::{BrokerStartError, ConfigError, SignatureError};
pub use event::{
    ErrorPayload, EventChannel, SmsEvent, SmsReceivedPayload, TimeoutPayload, TIMEOUT_MESSAGE,
};
pub use intent::{IntentExtras, RetrieverIntent, Status, StatusExtra, STATUS_SUCCESS, STATUS_TIMEOUT};
pub use router::{BroadcastRouter, ReceiverHandle};
pub use signature::{
    app_hash, compute_app_hashes, SignatureProvider, StaticSignatures, APP_HASH_LEN,
};
