//! Scriptable broker for tests.
//!
//! Available with the `test-support` feature.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::broker::{Ack, SmsBroker};
use crate::error::BrokerStartError;

/// Broker whose start outcomes are queued up front.
///
/// Once the queue is empty every start succeeds. Each call is recorded with
/// the tokio clock, so paused-time tests can measure backoff exactly.
#[derive(Debug, Default)]
pub struct MockBroker {
    outcomes: Mutex<VecDeque<Result<Ack, BrokerStartError>>>,
    calls: Mutex<Vec<Instant>>,
    hold: AtomicBool,
    release: Notify,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `failures` starts, then succeed
    pub fn failing_then_ok(failures: usize) -> Self {
        let broker = Self::new();
        for attempt in 1..=failures {
            broker.push_outcome(Err(BrokerStartError::Rejected(format!(
                "scripted failure {attempt}"
            ))));
        }
        broker
    }

    /// Queue the outcome of the next unscripted start
    pub fn push_outcome(&self, outcome: Result<Ack, BrokerStartError>) {
        self.outcomes.lock().push_back(outcome);
    }

    /// Make subsequent starts wait until [`release`](Self::release) is called
    pub fn hold_starts(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    /// Let one held start proceed and stop holding new ones
    pub fn release(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// When each start call happened
    pub fn call_instants(&self) -> Vec<Instant> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SmsBroker for MockBroker {
    async fn start_retrieval(&self) -> Result<Ack, BrokerStartError> {
        self.calls.lock().push(Instant::now());

        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }

        self.outcomes.lock().pop_front().unwrap_or(Ok(Ack))
    }
}
