//! Lifecycle of the single SMS listening session.
//!
//! `start` registers a broadcast receiver, asks the broker to begin a
//! retrieval and retries with exponential backoff when the broker refuses.
//! The first result broadcast completes the session: it is decoded, published
//! to the [`EventEmitter`] and every receiver registered for the session is
//! released before the manager returns to `Idle`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use sms_retriever::{
    decode, BroadcastRouter, ConfigError, ErrorPayload, ReceiverHandle, RetrieverConfig,
    RetrieverIntent, SmsBroker, SmsEvent, SmsReceivedPayload, TimeoutPayload,
};
use tracing::{debug, info, warn};

use crate::emitter::{EventEmitter, EventSubscription};
use crate::error::{StartError, StartResult};
use crate::session::{SessionCell, SessionState, Ticket};

/// Outcome of a successful [`OtpListenerManager::start`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    pub ticket: Ticket,
    /// Broker calls made, the successful one included
    pub attempts: u32,
    /// Delays waited between attempts, in order
    pub backoffs: Vec<Duration>,
}

struct Inner<B> {
    broker: B,
    router: BroadcastRouter,
    config: RetrieverConfig,
    session: SessionCell,
    /// Receivers tagged with the session that registered them
    handles: Mutex<Vec<(Ticket, ReceiverHandle)>>,
    emitter: EventEmitter,
    /// Generation whose broadcast arrived before the broker acknowledged
    completed_generation: AtomicU64,
}

impl<B> Inner<B> {
    fn release_handles(&self) -> usize {
        let handles: Vec<(Ticket, ReceiverHandle)> = self.handles.lock().drain(..).collect();
        for (_, handle) in &handles {
            self.router.unregister(handle);
        }
        if !handles.is_empty() {
            debug!("Released {} broadcast receiver(s)", handles.len());
        }
        handles.len()
    }

    /// Release the receivers of `ticket`'s session only. A newer session
    /// started from a listener callback keeps its own.
    fn release_session(&self, ticket: Ticket) -> usize {
        let released: Vec<ReceiverHandle> = {
            let mut handles = self.handles.lock();
            let mut released = Vec::new();
            handles.retain(|(owner, handle)| {
                if *owner == ticket {
                    released.push(handle.clone());
                    false
                } else {
                    true
                }
            });
            released
        };
        for handle in &released {
            self.router.unregister(handle);
        }
        if !released.is_empty() {
            debug!(
                "Released {} broadcast receiver(s) of session {}",
                released.len(),
                ticket
            );
        }
        released.len()
    }

    fn release_handle(&self, handle: &ReceiverHandle) {
        self.handles.lock().retain(|(_, h)| h != handle);
        self.router.unregister(handle);
    }

    fn completed(&self, ticket: Ticket) -> bool {
        self.session.is(ticket, SessionState::Completed)
            || self.completed_generation.load(Ordering::SeqCst) == ticket.generation()
    }
}

impl<B> Drop for Inner<B> {
    fn drop(&mut self) {
        self.release_handles();
    }
}

/// Handles a broadcast for `ticket`'s session. Only the first terminal
/// broadcast of a session gets through; the rest are stale.
fn on_broadcast<B: SmsBroker>(inner: &Weak<Inner<B>>, ticket: Ticket, intent: RetrieverIntent) {
    let Some(inner) = inner.upgrade() else {
        return;
    };

    let claimed = inner
        .session
        .transition(ticket, SessionState::Listening, SessionState::Completed)
        || inner
            .session
            .transition(ticket, SessionState::Starting, SessionState::Completed);
    if !claimed {
        debug!("Ignoring broadcast for inactive session {}", ticket);
        return;
    }
    inner
        .completed_generation
        .store(ticket.generation(), Ordering::SeqCst);

    let event = decode(&intent);
    info!("Session {} completed on {}", ticket, event.channel().name());
    inner.emitter.emit(&event);

    inner.release_session(ticket);
    inner
        .session
        .transition(ticket, SessionState::Completed, SessionState::Idle);
}

/// Undoes a start that did not reach `Listening`, including one whose
/// future was dropped mid-flight.
struct StartGuard<'a, B> {
    inner: &'a Inner<B>,
    ticket: Ticket,
    handle: ReceiverHandle,
    armed: bool,
}

impl<B> StartGuard<'_, B> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<B> Drop for StartGuard<'_, B> {
    fn drop(&mut self) {
        if self.armed {
            self.inner
                .session
                .transition(self.ticket, SessionState::Starting, SessionState::Idle);
            self.inner.release_handle(&self.handle);
        }
    }
}

/// Owner of the SMS listening session
///
/// At most one session exists at a time. Cloning is cheap; clones share the
/// session, the receivers and the listeners.
///
/// # Example
///
/// ```rust,ignore
/// use otp_event_manager::OtpListenerManager;
///
/// let manager = OtpListenerManager::new(broker);
/// manager.on_sms_received(|payload| println!("OTP: {:?}", payload.otp));
///
/// let started = manager.start().await?;
/// println!("listening after {} attempt(s)", started.attempts);
/// ```
pub struct OtpListenerManager<B: SmsBroker> {
    inner: Arc<Inner<B>>,
}

impl<B: SmsBroker> Clone for OtpListenerManager<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: SmsBroker> OtpListenerManager<B> {
    /// Create a manager with the default configuration
    pub fn new(broker: B) -> Self {
        Self::with_router(broker, BroadcastRouter::new(), RetrieverConfig::default())
    }

    /// Create a manager with a custom configuration
    pub fn with_config(broker: B, config: RetrieverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_router(broker, BroadcastRouter::new(), config))
    }

    /// Create a manager that registers its receivers on an existing router
    pub fn with_router(broker: B, router: BroadcastRouter, config: RetrieverConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                broker,
                router,
                config,
                session: SessionCell::new(),
                handles: Mutex::new(Vec::new()),
                emitter: EventEmitter::new(),
                completed_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Begin a listening session.
    ///
    /// Resolves once the broker acknowledges. Refused starts are retried up to
    /// `max_start_attempts` times in total, waiting `backoff_for(attempt)`
    /// after each failure.
    pub async fn start(&self) -> StartResult<Started> {
        let inner = &*self.inner;
        let ticket = inner.session.begin().map_err(|state| {
            warn!("SMS listener already active ({:?}), ignoring start", state);
            StartError::AlreadyActive { state }
        })?;
        info!("Starting SMS listener session {}", ticket);

        // A session that ended by stop() may have left receivers behind.
        inner.release_handles();

        let weak = Arc::downgrade(&self.inner);
        let handle = inner
            .router
            .register(inner.config.action.clone(), move |intent| {
                on_broadcast(&weak, ticket, intent)
            });
        inner.handles.lock().push((ticket, handle.clone()));

        let guard = StartGuard {
            inner,
            ticket,
            handle,
            armed: true,
        };

        let max_attempts = inner.config.max_start_attempts.max(1);
        let mut backoffs = Vec::new();
        let mut attempt = 1;

        loop {
            let outcome = inner.broker.start_retrieval().await;

            if !inner.session.is(ticket, SessionState::Starting) {
                if outcome.is_ok() && inner.completed(ticket) {
                    guard.disarm();
                    return Ok(Started {
                        ticket,
                        attempts: attempt,
                        backoffs,
                    });
                }
                info!("Session {} stopped while starting", ticket);
                return Err(StartError::Cancelled);
            }

            match outcome {
                Ok(_) => {
                    if inner
                        .session
                        .transition(ticket, SessionState::Starting, SessionState::Listening)
                    {
                        info!(
                            "SMS retriever started for session {} after {} attempt(s)",
                            ticket, attempt
                        );
                        guard.disarm();
                        return Ok(Started {
                            ticket,
                            attempts: attempt,
                            backoffs,
                        });
                    }

                    if inner.completed(ticket) {
                        guard.disarm();
                        return Ok(Started {
                            ticket,
                            attempts: attempt,
                            backoffs,
                        });
                    }
                    return Err(StartError::Cancelled);
                }
                Err(cause) => {
                    if attempt >= max_attempts {
                        warn!(
                            "Failed to start SMS retriever after {} attempt(s): {}",
                            attempt, cause
                        );
                        return Err(StartError::Exhausted {
                            attempts: attempt,
                            last_cause: cause,
                        });
                    }

                    let delay = inner.config.backoff_for(attempt);
                    warn!(
                        "SMS retriever start attempt {} failed: {}; retrying in {:?}",
                        attempt, cause, delay
                    );
                    backoffs.push(delay);
                    tokio::time::sleep(delay).await;

                    if !inner.session.is(ticket, SessionState::Starting) {
                        info!("Session {} stopped during backoff", ticket);
                        return Err(StartError::Cancelled);
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// End the session, if any, and release its receivers.
    ///
    /// Returns `false` when there was nothing to stop.
    pub fn stop(&self) -> bool {
        let previous = self.inner.session.reset();
        self.inner.release_handles();

        if previous == SessionState::Idle {
            debug!("Stop requested with no active session");
            false
        } else {
            info!("SMS listener stopped (was {:?})", previous);
            true
        }
    }

    /// Hand a platform broadcast to the router.
    ///
    /// Returns the number of receivers that saw it.
    pub fn deliver(&self, intent: RetrieverIntent) -> usize {
        self.inner.router.dispatch(intent)
    }

    pub fn on_sms_received<F>(&self, listener: F) -> EventSubscription
    where
        F: Fn(&SmsReceivedPayload) + Send + Sync + 'static,
    {
        self.inner.emitter.on_sms_received(listener)
    }

    pub fn on_timeout<F>(&self, listener: F) -> EventSubscription
    where
        F: Fn(&TimeoutPayload) + Send + Sync + 'static,
    {
        self.inner.emitter.on_timeout(listener)
    }

    pub fn on_error<F>(&self, listener: F) -> EventSubscription
    where
        F: Fn(&ErrorPayload) + Send + Sync + 'static,
    {
        self.inner.emitter.on_error(listener)
    }

    pub fn on_event<F>(&self, listener: F) -> EventSubscription
    where
        F: Fn(&SmsEvent) + Send + Sync + 'static,
    {
        self.inner.emitter.on_event(listener)
    }

    pub fn events(&self) -> &EventEmitter {
        &self.inner.emitter
    }

    pub fn router(&self) -> &BroadcastRouter {
        &self.inner.router
    }

    pub fn broker(&self) -> &B {
        &self.inner.broker
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.inner.config
    }

    pub fn state(&self) -> SessionState {
        self.inner.session.state()
    }

    /// Generation of the most recent session; 0 before the first start
    pub fn generation(&self) -> u64 {
        self.inner.session.generation()
    }

    pub fn is_listening(&self) -> bool {
        self.state() == SessionState::Listening
    }

    /// Receivers currently registered for this manager's sessions
    pub fn active_handles(&self) -> usize {
        self.inner.handles.lock().len()
    }
}

impl<B: SmsBroker> std::fmt::Debug for OtpListenerManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpListenerManager")
            .field("state", &self.state())
            .field("generation", &self.generation())
            .field("active_handles", &self.active_handles())
            .field("listeners", &self.inner.emitter.listener_count())
            .finish()
    }
}
