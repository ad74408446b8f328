//! Reactive app hash
//!
//! Computes the app signature hash once and keeps the outcome observable, the
//! same way [`OtpListener`](crate::OtpListener) exposes the listening state.

use std::sync::Arc;

use serde::Serialize;
use sms_retriever::{compute_app_hashes, SignatureProvider};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{ListenerError, Result};

type SuccessCallback = Arc<dyn Fn(&str) + Send + Sync>;
type FailureCallback = Arc<dyn Fn(&ListenerError) + Send + Sync>;

/// Callbacks for [`AppHash::fetch`]
#[derive(Clone, Default)]
pub struct HashOptions {
    on_success: Option<SuccessCallback>,
    on_error: Option<FailureCallback>,
}

impl HashOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ListenerError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }
}

impl std::fmt::Debug for HashOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashOptions")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HashSnapshot {
    pub hash: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Observable app signature hash
pub struct AppHash {
    provider: Arc<dyn SignatureProvider>,
    options: HashOptions,
    state: watch::Sender<HashSnapshot>,
}

impl AppHash {
    /// Create the hash state without computing anything yet
    pub fn new(provider: Arc<dyn SignatureProvider>, options: HashOptions) -> Self {
        let (state, _) = watch::channel(HashSnapshot::default());
        Self {
            provider,
            options,
            state,
        }
    }

    /// Create and fetch immediately
    pub fn fetched(provider: Arc<dyn SignatureProvider>, options: HashOptions) -> Self {
        let hash = Self::new(provider, options);
        // The outcome is recorded in the snapshot and reported to the callbacks.
        let _ = hash.fetch();
        hash
    }

    /// Compute the hash; the first certificate's hash wins.
    pub fn fetch(&self) -> Result<String> {
        self.state.send_modify(|snapshot| {
            snapshot.loading = true;
            snapshot.error = None;
        });

        let outcome = compute_app_hashes(self.provider.as_ref())
            .into_iter()
            .next()
            .ok_or(ListenerError::NoAppHash);

        match &outcome {
            Ok(hash) => {
                debug!("App hash for {}: {}", self.provider.package_name(), hash);
                self.state.send_modify(|snapshot| {
                    snapshot.hash = Some(hash.clone());
                    snapshot.loading = false;
                });
                if let Some(on_success) = &self.options.on_success {
                    on_success(hash);
                }
            }
            Err(e) => {
                warn!("No app hash for {}", self.provider.package_name());
                self.state.send_modify(|snapshot| {
                    snapshot.error = Some(e.to_string());
                    snapshot.loading = false;
                });
                if let Some(on_error) = &self.options.on_error {
                    on_error(e);
                }
            }
        }

        outcome
    }

    /// Same as [`fetch`](Self::fetch)
    pub fn refetch(&self) -> Result<String> {
        self.fetch()
    }

    pub fn snapshot(&self) -> HashSnapshot {
        self.state.borrow().clone()
    }

    pub fn hash(&self) -> Option<String> {
        self.state.borrow().hash.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<HashSnapshot> {
        self.state.subscribe()
    }
}

impl std::fmt::Debug for AppHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppHash")
            .field("package_name", &self.provider.package_name())
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
