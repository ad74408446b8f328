//! Handler-based API
//!
//! For callers that only want the code: handlers are called with the
//! extracted OTP and never see messages without one.

use std::sync::Arc;

use otp_event_manager::{EventSubscription, StartError, Started};
use parking_lot::Mutex;
use sms_retriever::SmsBroker;
use tracing::debug;

use crate::autofill::OtpAutofill;
use crate::error::SdkError;

/// Simplified OTP API over an [`OtpAutofill`]
///
/// Holds at most one handler registered through
/// [`start_otp_listener`](Self::start_otp_listener); registering another
/// replaces it.
pub struct OtpVerify<B: SmsBroker> {
    autofill: OtpAutofill<B>,
    current: Arc<Mutex<Option<EventSubscription>>>,
}

impl<B: SmsBroker> OtpVerify<B> {
    pub fn new(autofill: OtpAutofill<B>) -> Self {
        Self {
            autofill,
            current: Arc::default(),
        }
    }

    /// Start the retriever without registering a handler.
    ///
    /// The returned subscription removes the current handler, if any.
    pub async fn get_otp(&self) -> Result<OtpSubscription, SdkError> {
        self.autofill.get_otp().await?;
        let subscription = self.current.lock().clone();
        Ok(OtpSubscription { subscription })
    }

    pub fn get_hash(&self) -> Result<Vec<String>, SdkError> {
        self.autofill.get_hash()
    }

    pub fn request_hint(&self) -> Result<String, SdkError> {
        self.autofill.request_hint()
    }

    /// Register `handler` in place of the previous one and start listening.
    ///
    /// If a session is already running the handler joins it. If the start
    /// fails for any other reason the handler is removed again.
    pub async fn start_otp_listener<F>(&self, handler: F) -> Result<OtpSubscription, SdkError>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let subscription = self.add_listener(handler);
        if let Some(previous) = self.current.lock().replace(subscription.clone()) {
            debug!("Replacing previous OTP handler");
            previous.remove();
        }

        match self.autofill.start_otp_listener().await {
            Ok(Started { attempts, .. }) => {
                debug!("OTP handler armed after {} attempt(s)", attempts);
                Ok(OtpSubscription {
                    subscription: Some(subscription),
                })
            }
            Err(SdkError::Start(StartError::AlreadyActive { state })) => {
                debug!("Session already {:?}, OTP handler attached to it", state);
                Ok(OtpSubscription {
                    subscription: Some(subscription),
                })
            }
            Err(e) => {
                subscription.remove();
                Err(e)
            }
        }
    }

    /// Register an extra handler without starting the retriever
    pub fn add_listener<F>(&self, handler: F) -> EventSubscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.autofill.on_sms_received(move |payload| {
            if let Some(otp) = payload.otp.as_deref() {
                handler(otp);
            }
        })
    }

    pub fn autofill(&self) -> &OtpAutofill<B> {
        &self.autofill
    }
}

/// Handler registration returned by [`OtpVerify`]
///
/// Removing it, or dropping it, detaches the handler. The retriever session
/// itself ends on its own after the first result.
#[derive(Debug)]
#[must_use = "dropping the subscription removes the handler"]
pub struct OtpSubscription {
    subscription: Option<EventSubscription>,
}

impl OtpSubscription {
    /// Detach the handler. Returns `false` if there was nothing to remove.
    pub fn remove(&mut self) -> bool {
        self.subscription
            .take()
            .map_or(false, |subscription| subscription.remove())
    }

    pub fn is_active(&self) -> bool {
        self.subscription
            .as_ref()
            .map_or(false, EventSubscription::is_active)
    }
}

impl Drop for OtpSubscription {
    fn drop(&mut self) {
        self.remove();
    }
}
