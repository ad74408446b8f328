//! # OTP Event Manager
//!
//! Lifecycle of the SMS listening session behind otp-autofill.
//!
//! ## Overview
//!
//! [`OtpListenerManager`] owns at most one session at a time. Starting a
//! session registers a broadcast receiver and asks the [`SmsBroker`] to begin a
//! retrieval, retrying refused starts with exponential backoff. The first
//! result broadcast completes the session: it is decoded into an
//! [`SmsEvent`], published on exactly one channel and the receivers are
//! released.
//!
//! ```text
//!          start()                 broker ack              broadcast
//! Idle ─────────────► Starting ─────────────► Listening ─────────────► Completed ──► Idle
//!   ▲                    │ exhausted / stop()     │ stop()
//!   └────────────────────┴────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use otp_event_manager::OtpListenerManager;
//!
//! let manager = OtpListenerManager::new(broker);
//! let subscription = manager.on_sms_received(|payload| {
//!     println!("OTP: {:?}", payload.otp);
//! });
//!
//! manager.start().await?;
//!
//! // The platform side hands broadcasts over as they arrive
//! manager.deliver(intent);
//!
//! subscription.remove();
//! manager.stop();
//! ```
//!
//! ## Guarantees
//!
//! - A second `start` while a session exists fails with
//!   [`StartError::AlreadyActive`]; it never registers another receiver.
//! - Each session produces at most one notification. Broadcasts tagged with an
//!   older session's generation are ignored.
//! - `stop` is idempotent and always leaves no receivers registered.

pub mod emitter;
pub mod error;
pub mod manager;
pub mod session;

pub use emitter::{EventEmitter, EventSubscription};
pub use error::{StartError, StartResult};
pub use manager::{OtpListenerManager, Started};
pub use session::{SessionState, Ticket};

// Re-export commonly used types from dependencies
pub use sms_retriever::{
    BroadcastRouter, BrokerStartError, ErrorPayload, EventChannel, RetrieverConfig,
    RetrieverIntent, SmsBroker, SmsEvent, SmsReceivedPayload, TimeoutPayload,
};
