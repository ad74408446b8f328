//! Session state guard.
//!
//! The state of the single listening session and its generation number live
//! in one atomic word, so every check-and-set is a single compare-and-swap.
//! Broker callbacks carry the generation they were registered for; once a
//! session ends, callbacks tagged with its generation can no longer move the
//! state.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

const STATE_BITS: u32 = 8;
const STATE_MASK: u64 = (1 << STATE_BITS) - 1;

/// Lifecycle state of the listening session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    /// No session
    Idle = 0,
    /// Waiting for the broker to acknowledge, possibly between retries
    Starting = 1,
    /// Broker acknowledged; waiting for the result broadcast
    Listening = 2,
    /// Terminal notification is being delivered
    Completed = 3,
}

impl SessionState {
    fn from_bits(bits: u8) -> Self {
        match bits {
            1 => SessionState::Starting,
            2 => SessionState::Listening,
            3 => SessionState::Completed,
            _ => SessionState::Idle,
        }
    }
}

/// Generation of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

fn pack(generation: u64, state: SessionState) -> u64 {
    (generation << STATE_BITS) | state as u64
}

fn unpack(word: u64) -> (u64, SessionState) {
    (
        word >> STATE_BITS,
        SessionState::from_bits((word & STATE_MASK) as u8),
    )
}

/// Single-writer guard over the session state
#[derive(Debug, Default)]
pub(crate) struct SessionCell {
    word: AtomicU64,
}

impl SessionCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        unpack(self.word.load(Ordering::Acquire)).1
    }

    pub fn generation(&self) -> u64 {
        unpack(self.word.load(Ordering::Acquire)).0
    }

    /// `Idle → Starting` under a fresh generation.
    ///
    /// Fails with the current state when a session already exists.
    pub fn begin(&self) -> Result<Ticket, SessionState> {
        let mut current = self.word.load(Ordering::Acquire);
        loop {
            let (generation, state) = unpack(current);
            if state != SessionState::Idle {
                return Err(state);
            }

            let next = generation.wrapping_add(1);
            match self.word.compare_exchange_weak(
                current,
                pack(next, SessionState::Starting),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(Ticket(next)),
                Err(actual) => current = actual,
            }
        }
    }

    /// Move `ticket`'s session from `from` to `to`.
    ///
    /// Fails if the session is in another state or belongs to another generation.
    pub fn transition(&self, ticket: Ticket, from: SessionState, to: SessionState) -> bool {
        self.word
            .compare_exchange(
                pack(ticket.0, from),
                pack(ticket.0, to),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Whether `ticket`'s session is currently in `state`
    pub fn is(&self, ticket: Ticket, state: SessionState) -> bool {
        self.word.load(Ordering::Acquire) == pack(ticket.0, state)
    }

    /// Force the session back to `Idle` from any state, returning the previous state
    pub fn reset(&self) -> SessionState {
        let mut current = self.word.load(Ordering::Acquire);
        loop {
            let (generation, state) = unpack(current);
            if state == SessionState::Idle {
                return state;
            }

            match self.word.compare_exchange_weak(
                current,
                pack(generation, SessionState::Idle),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return state,
                Err(actual) => current = actual,
            }
        }
    }
}
