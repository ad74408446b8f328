//! Reactive OTP listener
//!
//! Wraps an [`OtpListenerManager`] in the shape UI code consumes: a snapshot
//! of the listening state published on a `tokio::sync::watch` channel, plus
//! optional callbacks for each terminal outcome.
//!
//! # Example
//!
//! ```rust,ignore
//! use otp_state::{ListenerOptions, OtpListener};
//!
//! let listener = OtpListener::new(
//!     manager.clone(),
//!     ListenerOptions::new().on_otp_received(|otp, _message| println!("OTP: {otp}")),
//! );
//!
//! let mut updates = listener.subscribe();
//! listener.start_listener().await?;
//! while updates.changed().await.is_ok() {
//!     let snapshot = updates.borrow().clone();
//!     if let Some(otp) = snapshot.received_otp {
//!         println!("{otp}");
//!         break;
//!     }
//! }
//! ```

use std::sync::Arc;

use otp_event_manager::{EventSubscription, OtpListenerManager, SmsBroker};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::error::Result;

/// Error text set when the broker reports a timeout
pub const TIMED_OUT_ERROR: &str = "SMS verification timed out";

/// Code passed to `on_error` when the listener fails to start
pub const START_FAILURE_CODE: i32 = -1;

type OtpCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;
type TimeoutCallback = Arc<dyn Fn(&str) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&str, i32) + Send + Sync>;

/// Callbacks invoked on terminal outcomes
#[derive(Clone, Default)]
pub struct ListenerOptions {
    on_otp_received: Option<OtpCallback>,
    on_timeout: Option<TimeoutCallback>,
    on_error: Option<ErrorCallback>,
}

impl ListenerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with `(otp, message)`; `otp` is empty when none was extracted
    pub fn on_otp_received<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.on_otp_received = Some(Arc::new(callback));
        self
    }

    /// Called with the broker's timeout message
    pub fn on_timeout<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_timeout = Some(Arc::new(callback));
        self
    }

    /// Called with `(message, code)`; `code` is -1 for start failures
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, i32) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }
}

impl std::fmt::Debug for ListenerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerOptions")
            .field("on_otp_received", &self.on_otp_received.is_some())
            .field("on_timeout", &self.on_timeout.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Listener state as seen by the UI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerSnapshot {
    pub is_listening: bool,
    pub loading: bool,
    pub received_otp: Option<String>,
    pub received_message: Option<String>,
    pub error: Option<String>,
}

struct Shared {
    state: watch::Sender<ListenerSnapshot>,
    options: RwLock<ListenerOptions>,
}

impl Shared {
    fn finish(&self, update: impl FnOnce(&mut ListenerSnapshot)) {
        self.state.send_modify(|snapshot| {
            update(snapshot);
            snapshot.is_listening = false;
            snapshot.loading = false;
        });
    }
}

/// Reactive handle over the listening session
///
/// Dropping the listener stops the session.
pub struct OtpListener<B: SmsBroker> {
    manager: OtpListenerManager<B>,
    shared: Arc<Shared>,
    subscriptions: Mutex<Vec<EventSubscription>>,
}

impl<B: SmsBroker> OtpListener<B> {
    pub fn new(manager: OtpListenerManager<B>, options: ListenerOptions) -> Self {
        let (state, _) = watch::channel(ListenerSnapshot::default());
        Self {
            manager,
            shared: Arc::new(Shared {
                state,
                options: RwLock::new(options),
            }),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Current state
    pub fn snapshot(&self) -> ListenerSnapshot {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<ListenerSnapshot> {
        self.shared.state.subscribe()
    }

    /// Replace the callbacks; takes effect for the next event, even mid-session
    pub fn set_options(&self, options: ListenerOptions) {
        *self.shared.options.write() = options;
    }

    pub fn manager(&self) -> &OtpListenerManager<B> {
        &self.manager
    }

    /// Start listening for an OTP.
    ///
    /// A no-op while already listening or starting. On failure the error is
    /// recorded in the snapshot, `on_error` is called with code -1 and the
    /// error is returned.
    pub async fn start_listener(&self) -> Result<()> {
        let mut claimed = false;
        self.shared.state.send_if_modified(|snapshot| {
            if snapshot.is_listening || snapshot.loading {
                return false;
            }
            snapshot.loading = true;
            snapshot.error = None;
            snapshot.received_otp = None;
            snapshot.received_message = None;
            claimed = true;
            true
        });
        if !claimed {
            warn!("SMS listener is already active");
            return Ok(());
        }

        self.release();
        self.subscribe_events();

        match self.manager.start().await {
            Ok(started) => {
                debug!("OTP listener started after {} attempt(s)", started.attempts);
                let manager = &self.manager;
                self.shared.state.send_if_modified(|snapshot| {
                    // A terminal event already cleared `loading`
                    if !snapshot.loading {
                        return false;
                    }
                    snapshot.is_listening = manager.is_listening();
                    snapshot.loading = false;
                    true
                });
                Ok(())
            }
            Err(e) => {
                error!("Failed to start OTP listener: {}", e);
                let message = e.to_string();
                self.shared.finish(|snapshot| snapshot.error = Some(message.clone()));

                let on_error = self.shared.options.read().on_error.clone();
                if let Some(on_error) = on_error {
                    on_error(&message, START_FAILURE_CODE);
                }
                Err(e.into())
            }
        }
    }

    /// Stop listening and drop this listener's event subscriptions
    pub fn stop_listener(&self) {
        self.release();
        self.shared.state.send_if_modified(|snapshot| {
            let changed = snapshot.is_listening || snapshot.loading;
            snapshot.is_listening = false;
            snapshot.loading = false;
            changed
        });
    }

    fn release(&self) {
        for subscription in self.subscriptions.lock().drain(..) {
            subscription.remove();
        }
        self.manager.stop();
    }

    fn subscribe_events(&self) {
        let received = {
            let shared = Arc::clone(&self.shared);
            self.manager.on_sms_received(move |payload| {
                debug!("SMS received by listener");
                let otp = payload.otp.clone().unwrap_or_default();
                shared.finish(|snapshot| {
                    snapshot.received_otp = payload.otp.clone();
                    snapshot.received_message = Some(payload.message.clone());
                });

                let callback = shared.options.read().on_otp_received.clone();
                if let Some(callback) = callback {
                    callback(&otp, &payload.message);
                }
            })
        };

        let timeout = {
            let shared = Arc::clone(&self.shared);
            self.manager.on_timeout(move |payload| {
                debug!("SMS listener timed out");
                shared.finish(|snapshot| snapshot.error = Some(TIMED_OUT_ERROR.to_string()));

                let callback = shared.options.read().on_timeout.clone();
                if let Some(callback) = callback {
                    callback(&payload.message);
                }
            })
        };

        let errored = {
            let shared = Arc::clone(&self.shared);
            self.manager.on_error(move |payload| {
                debug!("SMS listener error {}: {}", payload.code, payload.message);
                shared.finish(|snapshot| snapshot.error = Some(payload.message.clone()));

                let callback = shared.options.read().on_error.clone();
                if let Some(callback) = callback {
                    callback(&payload.message, payload.code);
                }
            })
        };

        self.subscriptions
            .lock()
            .extend([received, timeout, errored]);
    }
}

impl<B: SmsBroker> Drop for OtpListener<B> {
    fn drop(&mut self) {
        self.stop_listener();
    }
}

impl<B: SmsBroker> std::fmt::Debug for OtpListener<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpListener")
            .field("snapshot", &self.snapshot())
            .field("subscriptions", &self.subscriptions.lock().len())
            .finish()
    }
}
