use std::sync::Arc;

use otp_event_manager::{EventSubscription, OtpListenerManager, Started};
use otp_state::{AppHash, HashOptions, ListenerOptions, OtpListener};
use sms_retriever::{
    compute_app_hashes, BroadcastRouter, ErrorPayload, RetrieverConfig, RetrieverIntent,
    SignatureProvider, SmsBroker, SmsEvent, SmsReceivedPayload, TimeoutPayload,
};
use tracing::{debug, info};

use crate::error::SdkError;
use crate::verify::OtpVerify;

/// Reply of [`OtpAutofill::stop_sms_retriever`]
pub const STOPPED_MESSAGE: &str = "SMS Retriever stopped";

/// Entry point for SMS OTP autofill
///
/// Owns the listening session and the app's signature identity. Cloning is
/// cheap; clones share the session and its listeners.
pub struct OtpAutofill<B: SmsBroker> {
    manager: OtpListenerManager<B>,
    signatures: Arc<dyn SignatureProvider>,
}

impl<B: SmsBroker> Clone for OtpAutofill<B> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            signatures: Arc::clone(&self.signatures),
        }
    }
}

impl<B: SmsBroker> OtpAutofill<B> {
    /// Create with the default retriever configuration
    pub fn new(broker: B, signatures: impl SignatureProvider + 'static) -> Self {
        Self {
            manager: OtpListenerManager::new(broker),
            signatures: Arc::new(signatures),
        }
    }

    /// Create with a custom retriever configuration
    pub fn with_config(
        broker: B,
        signatures: impl SignatureProvider + 'static,
        config: RetrieverConfig,
    ) -> Result<Self, SdkError> {
        Ok(Self {
            manager: OtpListenerManager::with_config(broker, config)?,
            signatures: Arc::new(signatures),
        })
    }

    /// Create on top of the platform's broadcast router
    pub fn with_router(
        broker: B,
        signatures: impl SignatureProvider + 'static,
        router: BroadcastRouter,
        config: RetrieverConfig,
    ) -> Result<Self, SdkError> {
        config.validate()?;
        Ok(Self {
            manager: OtpListenerManager::with_router(broker, router, config),
            signatures: Arc::new(signatures),
        })
    }

    /// App hashes, one per signing certificate
    pub fn get_hash(&self) -> Result<Vec<String>, SdkError> {
        let hashes = compute_app_hashes(self.signatures.as_ref());
        if hashes.is_empty() {
            return Err(SdkError::HashUnavailable);
        }
        debug!("Generated {} app hash(es)", hashes.len());
        Ok(hashes)
    }

    /// Start listening for an SMS.
    ///
    /// Resolves once the retriever is watching; the message itself arrives
    /// on the event channels.
    pub async fn start_otp_listener(&self) -> Result<Started, SdkError> {
        let started = self.manager.start().await?;
        info!("OTP listener started");
        Ok(started)
    }

    /// Same flow as [`start_otp_listener`](Self::start_otp_listener)
    pub async fn get_otp(&self) -> Result<Started, SdkError> {
        self.start_otp_listener().await
    }

    /// Stop the retriever session. Always succeeds.
    pub fn stop_sms_retriever(&self) -> &'static str {
        self.manager.stop();
        STOPPED_MESSAGE
    }

    /// Phone number hints are not available
    pub fn request_hint(&self) -> Result<String, SdkError> {
        debug!("Phone number hint not supported");
        Err(SdkError::PhoneHintNotSupported)
    }

    pub fn on_sms_received<F>(&self, listener: F) -> EventSubscription
    where
        F: Fn(&SmsReceivedPayload) + Send + Sync + 'static,
    {
        self.manager.on_sms_received(listener)
    }

    pub fn on_timeout<F>(&self, listener: F) -> EventSubscription
    where
        F: Fn(&TimeoutPayload) + Send + Sync + 'static,
    {
        self.manager.on_timeout(listener)
    }

    pub fn on_error<F>(&self, listener: F) -> EventSubscription
    where
        F: Fn(&ErrorPayload) + Send + Sync + 'static,
    {
        self.manager.on_error(listener)
    }

    pub fn on_event<F>(&self, listener: F) -> EventSubscription
    where
        F: Fn(&SmsEvent) + Send + Sync + 'static,
    {
        self.manager.on_event(listener)
    }

    /// Hand a platform broadcast to the active session
    pub fn deliver_broadcast(&self, intent: RetrieverIntent) -> usize {
        self.manager.deliver(intent)
    }

    /// Reactive listener bound to this session
    pub fn listener(&self, options: ListenerOptions) -> OtpListener<B> {
        OtpListener::new(self.manager.clone(), options)
    }

    /// Reactive app hash, fetched immediately
    pub fn app_hash(&self, options: HashOptions) -> AppHash {
        AppHash::fetched(Arc::clone(&self.signatures), options)
    }

    /// Simplified handler-based API
    pub fn verify(&self) -> OtpVerify<B> {
        OtpVerify::new(self.clone())
    }

    pub fn manager(&self) -> &OtpListenerManager<B> {
        &self.manager
    }
}

impl<B: SmsBroker> std::fmt::Debug for OtpAutofill<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpAutofill")
            .field("package_name", &self.signatures.package_name())
            .field("manager", &self.manager)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sms_retriever::mock::MockBroker;
    use sms_retriever::StaticSignatures;

    fn autofill() -> OtpAutofill<MockBroker> {
        OtpAutofill::new(
            MockBroker::new(),
            StaticSignatures::new("com.example.app", ["3082abcd"]),
        )
    }

    #[test]
    fn test_get_hash() {
        assert_eq!(autofill().get_hash().unwrap(), vec!["7OS8_g6GQfB".to_string()]);
    }

    #[test]
    fn test_get_hash_without_certificates() {
        let autofill = OtpAutofill::new(
            MockBroker::new(),
            StaticSignatures::new("com.example.app", Vec::<String>::new()),
        );
        assert_eq!(autofill.get_hash(), Err(SdkError::HashUnavailable));
    }

    #[test]
    fn test_request_hint_unsupported() {
        assert_eq!(
            autofill().request_hint(),
            Err(SdkError::PhoneHintNotSupported)
        );
    }

    #[tokio::test]
    async fn test_stop_reply() {
        let autofill = autofill();
        autofill.start_otp_listener().await.unwrap();
        assert_eq!(autofill.stop_sms_retriever(), STOPPED_MESSAGE);
        assert!(!autofill.manager().is_listening());
        assert_eq!(autofill.stop_sms_retriever(), "SMS Retriever stopped");
    }
}
