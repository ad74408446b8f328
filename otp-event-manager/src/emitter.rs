//! Observer list for the three notification channels.
//!
//! Every `on_*` call returns an [`EventSubscription`]; calling
//! [`remove`](EventSubscription::remove) detaches exactly that listener.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use sms_retriever::{ErrorPayload, EventChannel, SmsEvent, SmsReceivedPayload, TimeoutPayload};

type Listener = Arc<dyn Fn(&SmsEvent) + Send + Sync>;

struct Entry {
    id: u64,
    /// `None` listens on every channel
    channel: Option<EventChannel>,
    listener: Listener,
}

#[derive(Default)]
struct EmitterInner {
    listeners: RwLock<Vec<Entry>>,
    next_id: AtomicU64,
}

impl EmitterInner {
    fn remove(&self, id: u64) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        listeners.len() != before
    }
}

/// Fan-out of [`SmsEvent`]s to registered listeners.
///
/// Cloning is cheap; clones share one listener list.
#[derive(Clone, Default)]
pub struct EventEmitter {
    inner: Arc<EmitterInner>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen on `onSmsReceived`
    pub fn on_sms_received<F>(&self, listener: F) -> EventSubscription
    where
        F: Fn(&SmsReceivedPayload) + Send + Sync + 'static,
    {
        self.add(Some(EventChannel::SmsReceived), move |event| {
            if let SmsEvent::Received(payload) = event {
                listener(payload);
            }
        })
    }

    /// Listen on `onTimeout`
    pub fn on_timeout<F>(&self, listener: F) -> EventSubscription
    where
        F: Fn(&TimeoutPayload) + Send + Sync + 'static,
    {
        self.add(Some(EventChannel::Timeout), move |event| {
            if let SmsEvent::Timeout(payload) = event {
                listener(payload);
            }
        })
    }

    /// Listen on `onError`
    pub fn on_error<F>(&self, listener: F) -> EventSubscription
    where
        F: Fn(&ErrorPayload) + Send + Sync + 'static,
    {
        self.add(Some(EventChannel::Error), move |event| {
            if let SmsEvent::Error(payload) = event {
                listener(payload);
            }
        })
    }

    /// Listen on all three channels
    pub fn on_event<F>(&self, listener: F) -> EventSubscription
    where
        F: Fn(&SmsEvent) + Send + Sync + 'static,
    {
        self.add(None, listener)
    }

    fn add<F>(&self, channel: Option<EventChannel>, listener: F) -> EventSubscription
    where
        F: Fn(&SmsEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.write().push(Entry {
            id,
            channel,
            listener: Arc::new(listener),
        });

        EventSubscription {
            id,
            channel,
            emitter: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `event` to the listeners of its channel, in registration order.
    ///
    /// Returns the number of listeners invoked. The list lock is released
    /// before any listener runs.
    pub fn emit(&self, event: &SmsEvent) -> usize {
        let channel = event.channel();
        let targets: Vec<Listener> = self
            .inner
            .listeners
            .read()
            .iter()
            .filter(|entry| entry.channel.map_or(true, |c| c == channel))
            .map(|entry| Arc::clone(&entry.listener))
            .collect();

        tracing::debug!(
            "Emitting {} to {} listener(s)",
            channel.name(),
            targets.len()
        );

        for listener in &targets {
            listener(event);
        }
        targets.len()
    }

    /// Total number of listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    /// Listeners that would receive an event on `channel`
    pub fn listener_count_for(&self, channel: EventChannel) -> usize {
        self.inner
            .listeners
            .read()
            .iter()
            .filter(|entry| entry.channel.map_or(true, |c| c == channel))
            .count()
    }

    /// Drop every listener
    pub fn remove_all(&self) {
        self.inner.listeners.write().clear();
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

/// Registration of one listener.
///
/// Dropping the subscription keeps the listener attached; call
/// [`remove`](Self::remove) to detach it. Clones refer to the same listener.
#[derive(Debug, Clone)]
pub struct EventSubscription {
    id: u64,
    channel: Option<EventChannel>,
    emitter: Weak<EmitterInner>,
}

impl EventSubscription {
    /// Detach the listener. Returns `false` if it was already removed.
    pub fn remove(&self) -> bool {
        self.emitter
            .upgrade()
            .map_or(false, |inner| inner.remove(self.id))
    }

    /// Whether the listener is still attached
    pub fn is_active(&self) -> bool {
        self.emitter.upgrade().map_or(false, |inner| {
            inner.listeners.read().iter().any(|entry| entry.id == self.id)
        })
    }

    /// Channel the listener is attached to; `None` for all channels
    pub fn channel(&self) -> Option<EventChannel> {
        self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_channel_filtering() {
        let emitter = EventEmitter::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let timeouts = Arc::new(Mutex::new(0));

        let sink = Arc::clone(&received);
        emitter.on_sms_received(move |payload| sink.lock().push(payload.otp.clone()));
        let counter = Arc::clone(&timeouts);
        emitter.on_timeout(move |_| *counter.lock() += 1);

        assert_eq!(
            emitter.emit(&SmsEvent::received("code 1234", Some("1234".to_string()))),
            1
        );
        assert_eq!(emitter.emit(&SmsEvent::error("boom", -1)), 0);

        assert_eq!(*received.lock(), vec![Some("1234".to_string())]);
        assert_eq!(*timeouts.lock(), 0);
    }

    #[test]
    fn test_on_event_sees_every_channel() {
        let emitter = EventEmitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        emitter.on_event(move |event| sink.lock().push(event.channel()));

        emitter.emit(&SmsEvent::timeout());
        emitter.emit(&SmsEvent::error("boom", -1));

        assert_eq!(
            *seen.lock(),
            vec![EventChannel::Timeout, EventChannel::Error]
        );
        assert_eq!(emitter.listener_count_for(EventChannel::SmsReceived), 1);
    }

    #[test]
    fn test_remove_is_deterministic_and_idempotent() {
        let emitter = EventEmitter::new();
        let hits = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&hits);
        let subscription = emitter.on_error(move |_| *counter.lock() += 1);
        let other = emitter.on_error(|_| {});

        assert!(subscription.is_active());
        assert!(subscription.remove());
        assert!(!subscription.remove());
        assert!(!subscription.is_active());
        assert!(other.is_active());

        emitter.emit(&SmsEvent::error("boom", -1));
        assert_eq!(*hits.lock(), 0);
        assert_eq!(emitter.listener_count(), 1);
    }

    #[test]
    fn test_listener_may_remove_itself_during_emit() {
        let emitter = EventEmitter::new();
        let slot: Arc<Mutex<Option<EventSubscription>>> = Arc::default();

        let inner_slot = Arc::clone(&slot);
        let subscription = emitter.on_timeout(move |_| {
            if let Some(subscription) = inner_slot.lock().take() {
                subscription.remove();
            }
        });
        *slot.lock() = Some(subscription);

        assert_eq!(emitter.emit(&SmsEvent::timeout()), 1);
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_subscription_outliving_emitter() {
        let emitter = EventEmitter::new();
        let subscription = emitter.on_timeout(|_| {});
        drop(emitter);
        assert!(!subscription.remove());
        assert!(!subscription.is_active());
    }
}
