//! The responder-side poll/dispatch loop.

use std::sync::Arc;

use crate::backoff::Backoff;
use crate::slot::CallSlot;
use crate::table::CallTable;

/// Outcome of a single poll iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A pending request was dispatched and marked done.
    Dispatched,
    /// No request was pending.
    Idle,
    /// The slot was stopped; the loop must terminate.
    Stopped,
}

/// Drives a [`CallSlot`] on the responder side.
///
/// The responder does not spawn its own thread; the component owning the
/// slot decides where [`Responder::run`] executes and joins it after
/// [`CallSlot::stop`]. Single-threaded tests can step the protocol through
/// [`Responder::poll_once`] instead.
pub struct Responder<T, B: Backoff> {
    slot: Arc<CallSlot<T, B>>,
    table: CallTable<T>,
}

impl<T, B: Backoff> Responder<T, B> {
    pub fn new(slot: Arc<CallSlot<T, B>>, table: CallTable<T>) -> Self {
        Self { slot, table }
    }

    /// One protocol iteration: check for stop, dispatch a pending request
    /// if there is one. Never relaxes; pacing belongs to [`Responder::run`].
    pub fn poll_once(&mut self) -> Poll {
        self.slot.poll(&self.table)
    }

    /// Polls until the slot is stopped, relaxing after idle iterations.
    ///
    /// Runs for the lifetime of the pair; call [`CallSlot::stop`] from the
    /// owning thread to terminate it.
    pub fn run(&mut self) {
        loop {
            match self.poll_once() {
                Poll::Dispatched => {}
                Poll::Idle => self.slot.relax(),
                Poll::Stopped => break,
            }
        }
    }
}
