//! The shared call slot and the requester-side call routine.
//!
//! The slot is the rendezvous point between exactly one requester and one
//! responder. The requester publishes a request under the slot's spin lock
//! and busy-polls until the responder marks it done; the responder polls the
//! same slot from [`crate::Responder`]. Two flags split the ownership
//! handoff: `busy` says who owns the slot (claimed by the requester, cleared
//! by the requester once it has consumed the result), `is_done` says the
//! result is ready (set by the responder). Keeping the clear of `busy` on
//! the requester side guarantees a new request cannot land in the slot
//! before the previous result was consumed.

use std::ptr;

use crate::backoff::{Backoff, SpinBackoff};
use crate::lock::SpinLock;
use crate::responder::Poll;
use crate::table::CallTable;

/// Claim attempts a requester makes before `call` gives up with
/// [`CallError::Busy`].
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Error returned when [`CallSlot::call`] fails.
///
/// Either way the call was never published and had no side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallError {
    /// The slot stayed claimed by an outstanding request for the whole
    /// retry budget. Retryable; treat as backpressure.
    Busy,
    /// The slot was stopped before the request could be published.
    Stopped,
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallError::Busy => write!(f, "call slot is busy"),
            CallError::Stopped => write!(f, "call slot is stopped"),
        }
    }
}

impl std::error::Error for CallError {}

/// Result of a single claim attempt.
pub(crate) enum Publish {
    Published,
    Busy,
    Stopped,
}

/// All slot fields live behind one spin lock. The lock protects the
/// metadata only; the payload the pointer refers to is accessed unlocked,
/// exclusively by whichever side currently owns the handoff.
struct State<T> {
    payload: *mut T,
    call_id: u16,
    keep_polling: bool,
    run_function: bool,
    is_done: bool,
    busy: bool,
}

impl<T> State<T> {
    const fn initial() -> Self {
        Self {
            payload: ptr::null_mut(),
            call_id: 0,
            keep_polling: true,
            run_function: false,
            is_done: false,
            busy: false,
        }
    }
}

/// Shared descriptor coordinating one requester/responder pair.
///
/// Construct once, share via `Arc` with a [`crate::Responder`], and reuse
/// across any number of calls. The protocol assumes a single requester at a
/// time; a second thread racing [`CallSlot::call`] on the same slot is
/// bounced off the `busy` flag and receives [`CallError::Busy`], but the
/// slot offers no arbitration beyond that single flag.
pub struct CallSlot<T, B: Backoff = SpinBackoff> {
    state: SpinLock<State<T>>,
    backoff: B,
    max_retries: u32,
}

// The raw payload pointer is only dereferenced by the responder while the
// requester is parked inside `call`, holding the `&mut T` the pointer was
// derived from. So the pointer never outlives its borrow and the slot is as
// thread-safe as `T: Send` allows.
unsafe impl<T: Send, B: Backoff + Send> Send for CallSlot<T, B> {}
unsafe impl<T: Send, B: Backoff + Sync> Sync for CallSlot<T, B> {}

impl<T> CallSlot<T> {
    /// Creates a slot with the default backoff and retry budget.
    pub fn new() -> Self {
        Self::with_backoff(SpinBackoff::default(), DEFAULT_MAX_RETRIES)
    }
}

impl<T> Default for CallSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, B: Backoff> CallSlot<T, B> {
    /// Creates a slot with a custom backoff strategy and claim retry budget.
    pub fn with_backoff(backoff: B, max_retries: u32) -> Self {
        Self {
            state: SpinLock::new(State::initial()),
            backoff,
            max_retries,
        }
    }

    /// Issues a call and blocks (by polling) until the responder completes it.
    ///
    /// `payload` is lent to the responder for the duration of the call; the
    /// handler registered under `call_id` receives `&mut T` and communicates
    /// its result through the payload's own fields. Out-of-range and
    /// unregistered IDs complete the round trip without invoking anything.
    ///
    /// Returns the number of claim retries consumed, informational only. On
    /// `Err` the call was never published and had no effect.
    pub fn call(&self, call_id: u16, payload: &mut T) -> Result<u32, CallError> {
        let payload = payload as *mut T;
        let mut retries = 0u32;

        // Phase 1: claim the slot and publish the request.
        loop {
            match self.try_publish(call_id, payload) {
                Publish::Published => break,
                Publish::Stopped => return Err(CallError::Stopped),
                Publish::Busy => {
                    retries += 1;
                    if retries > self.max_retries {
                        return Err(CallError::Busy);
                    }
                    self.backoff.relax();
                }
            }
        }

        // Phase 2: wait for completion. No cap: once published, the request
        // will be dispatched as long as the responder is alive and polling.
        while !self.try_consume() {
            self.backoff.relax();
        }

        Ok(retries)
    }

    /// Stops the responder loop. Observed on its next poll iteration.
    ///
    /// Does not drain or cancel: calling this while a request is in flight
    /// is a precondition violation with unspecified outcome (the responder
    /// may or may not dispatch the pending request before exiting).
    pub fn stop(&self) {
        let mut state = self.state.lock();
        debug_assert!(!state.busy, "stop() while a call is in flight");
        state.keep_polling = false;
    }

    /// Single claim attempt: phase 1 body of `call`.
    pub(crate) fn try_publish(&self, call_id: u16, payload: *mut T) -> Publish {
        let mut state = self.state.lock();
        if !state.keep_polling {
            return Publish::Stopped;
        }
        if state.busy {
            return Publish::Busy;
        }
        state.busy = true;
        state.is_done = false;
        state.run_function = true;
        state.call_id = call_id;
        state.payload = payload;
        Publish::Published
    }

    /// Single completion check: phase 2 body of `call`. On `true` the slot
    /// is released for the next request.
    pub(crate) fn try_consume(&self) -> bool {
        let mut state = self.state.lock();
        if !state.is_done {
            return false;
        }
        state.busy = false;
        state.payload = ptr::null_mut();
        true
    }

    /// One responder iteration: poll for a pending request and dispatch it.
    pub(crate) fn poll(&self, table: &CallTable<T>) -> Poll {
        let state = self.state.lock();
        if !state.keep_polling {
            return Poll::Stopped;
        }
        if !state.run_function {
            return Poll::Idle;
        }
        let call_id = state.call_id;
        let payload = state.payload;
        drop(state);

        // The handler may run arbitrarily long, never under the lock. The
        // requester is parked in `call` until `is_done`, so the pointer it
        // published is still backed by its live `&mut T`.
        if let Some(handler) = table.get(call_id) {
            handler(unsafe { &mut *payload });
        }

        let mut state = self.state.lock();
        state.is_done = true;
        state.run_function = false;
        Poll::Dispatched
    }

    /// Relax between polls using the slot's backoff strategy.
    pub(crate) fn relax(&self) {
        self.backoff.relax();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn increment_table() -> CallTable<u64> {
        let mut table = CallTable::with_capacity(1);
        table.register(0, |v: &mut u64| *v += 1);
        table
    }

    #[test]
    fn test_initial_state() {
        let slot = CallSlot::<u64>::new();
        let state = slot.state.lock();
        assert!(state.payload.is_null());
        assert_eq!(state.call_id, 0);
        assert!(state.keep_polling);
        assert!(!state.run_function);
        assert!(!state.is_done);
        assert!(!state.busy);
    }

    #[test]
    fn test_claim_then_busy() {
        let slot = CallSlot::<u64>::new();
        let mut data = 0u64;

        assert!(matches!(
            slot.try_publish(0, &mut data),
            Publish::Published
        ));
        assert!(matches!(slot.try_publish(0, &mut data), Publish::Busy));
    }

    #[test]
    fn test_publish_after_stop() {
        let slot = CallSlot::<u64>::new();
        slot.stop();

        let mut data = 0u64;
        assert!(matches!(slot.try_publish(0, &mut data), Publish::Stopped));
        assert_eq!(slot.call(0, &mut data), Err(CallError::Stopped));
    }

    #[test]
    fn test_single_threaded_round_trip() {
        let slot = CallSlot::<u64>::new();
        let table = increment_table();
        let mut data = 0u64;

        assert!(matches!(
            slot.try_publish(0, &mut data),
            Publish::Published
        ));
        // Not done yet: nothing dispatched.
        assert!(!slot.try_consume());

        assert!(matches!(slot.poll(&table), Poll::Dispatched));
        assert!(slot.try_consume());
        assert_eq!(data, 1);

        // Slot is reusable after the requester consumed the result.
        assert!(matches!(
            slot.try_publish(0, &mut data),
            Publish::Published
        ));
        assert!(matches!(slot.poll(&table), Poll::Dispatched));
        assert!(slot.try_consume());
        assert_eq!(data, 2);
    }

    #[test]
    fn test_out_of_range_id_completes_without_effect() {
        let slot = CallSlot::<u64>::new();
        let table = increment_table();
        let mut data = 7u64;

        assert!(matches!(
            slot.try_publish(9, &mut data),
            Publish::Published
        ));
        // The round trip completes even though no handler ran.
        assert!(matches!(slot.poll(&table), Poll::Dispatched));
        assert!(slot.try_consume());
        assert_eq!(data, 7);
    }

    #[test]
    fn test_poll_observes_stop() {
        let slot = CallSlot::<u64>::new();
        let table = increment_table();

        assert!(matches!(slot.poll(&table), Poll::Idle));
        slot.stop();
        assert!(matches!(slot.poll(&table), Poll::Stopped));
    }
}
