//! OTP Autofill State
//!
//! Reactive adapters over the listening session, for UI code that renders
//! from state rather than reacting to individual events.
//!
//! # Features
//!
//! - **[`OtpListener`]**: listening/loading flags, the received OTP and the
//!   last error, published on a `tokio::sync::watch` channel
//! - **[`AppHash`]**: the app signature hash with loading and error state
//! - **[`logging`]**: subscriber setup driven by `OTP_LOG_MODE`
//!
//! # Architecture
//!
//! ```text
//! OtpListenerManager ──► EventEmitter ──► OtpListener ──► watch::Receiver<ListenerSnapshot>
//!                                              │
//!                                              └──► ListenerOptions callbacks
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use otp_state::{ListenerOptions, OtpListener};
//!
//! let listener = OtpListener::new(
//!     manager,
//!     ListenerOptions::new()
//!         .on_otp_received(|otp, _| println!("OTP: {otp}"))
//!         .on_timeout(|message| println!("{message}")),
//! );
//! listener.start_listener().await?;
//! ```

pub mod error;
pub mod hash;
pub mod listener;
pub mod logging;

pub use error::{ListenerError, Result};
pub use hash::{AppHash, HashOptions, HashSnapshot};
pub use listener::{
    ListenerOptions, ListenerSnapshot, OtpListener, START_FAILURE_CODE, TIMED_OUT_ERROR,
};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
