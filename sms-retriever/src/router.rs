//! Broadcast routing for retriever results.
//!
//! This module provides the `BroadcastRouter`, which keeps the set of
//! registered broadcast receivers and hands each incoming
//! [`RetrieverIntent`] to the receivers registered for its action.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::intent::RetrieverIntent;

type Receiver = Arc<dyn Fn(RetrieverIntent) + Send + Sync>;

/// Registration of one receiver with the router.
///
/// Pass it back to [`BroadcastRouter::unregister`] to stop deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiverHandle {
    id: Uuid,
    action: String,
}

impl ReceiverHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Action this receiver was registered for
    pub fn action(&self) -> &str {
        &self.action
    }
}

struct Registration {
    action: String,
    receiver: Receiver,
}

/// Routes retriever broadcasts to registered receivers.
///
/// Cloning is cheap; clones share the same registrations.
#[derive(Clone, Default)]
pub struct BroadcastRouter {
    receivers: Arc<RwLock<HashMap<Uuid, Registration>>>,
}

impl BroadcastRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a receiver for broadcasts carrying `action`.
    ///
    /// # Example
    ///
    /// ```
    /// use sms_retriever::{BroadcastRouter, RetrieverIntent, SMS_RETRIEVED_ACTION};
    ///
    /// let router = BroadcastRouter::new();
    /// let handle = router.register(SMS_RETRIEVED_ACTION, |intent| {
    ///     println!("got {:?}", intent.action);
    /// });
    ///
    /// assert_eq!(router.dispatch(RetrieverIntent::timed_out(SMS_RETRIEVED_ACTION)), 1);
    /// router.unregister(&handle);
    /// assert_eq!(router.dispatch(RetrieverIntent::timed_out(SMS_RETRIEVED_ACTION)), 0);
    /// ```
    pub fn register<F>(&self, action: impl Into<String>, receiver: F) -> ReceiverHandle
    where
        F: Fn(RetrieverIntent) + Send + Sync + 'static,
    {
        let handle = ReceiverHandle {
            id: Uuid::new_v4(),
            action: action.into(),
        };

        self.receivers.write().insert(
            handle.id,
            Registration {
                action: handle.action.clone(),
                receiver: Arc::new(receiver),
            },
        );

        tracing::debug!("Registered broadcast receiver {} for {}", handle.id, handle.action);
        handle
    }

    /// Remove a receiver. Returns `false` if it was already gone.
    pub fn unregister(&self, handle: &ReceiverHandle) -> bool {
        let removed = self.receivers.write().remove(&handle.id).is_some();
        if removed {
            tracing::debug!("Unregistered broadcast receiver {}", handle.id);
        }
        removed
    }

    /// Whether `handle` is still registered
    pub fn is_registered(&self, handle: &ReceiverHandle) -> bool {
        self.receivers.read().contains_key(&handle.id)
    }

    /// Number of registered receivers
    pub fn receiver_count(&self) -> usize {
        self.receivers.read().len()
    }

    /// Deliver a broadcast to every receiver registered for its action.
    ///
    /// Returns how many receivers were invoked. Receivers run on the calling
    /// thread, after the registry lock has been released, so a receiver may
    /// unregister itself.
    pub fn dispatch(&self, intent: RetrieverIntent) -> usize {
        let targets: Vec<Receiver> = {
            let receivers = self.receivers.read();
            receivers
                .values()
                .filter(|r| r.action == intent.action)
                .map(|r| Arc::clone(&r.receiver))
                .collect()
        };

        if targets.is_empty() {
            tracing::warn!("Unexpected broadcast action received: {}", intent.action);
            return 0;
        }

        for receiver in &targets {
            receiver(intent.clone());
        }

        targets.len()
    }
}

impl std::fmt::Debug for BroadcastRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastRouter")
            .field("receiver_count", &self.receiver_count())
            .finish()
    }
}
