//! Event aggregator.
//!
//! Bridges the engine's callback world and the workflow's sequential
//! awaits: the engine pushes events from whatever thread it runs on, and a
//! waiter suspends until at least `n` events have piled up, then takes the
//! whole buffer in one go.

use crate::engine::EventHandler;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::trace;

/// A shared, append-only event buffer with broadcast wakeups.
///
/// Cloning yields another handle onto the same buffer, so the engine side
/// and the workflow side can each hold one.
pub struct EventAggregator<E> {
    inner: Arc<AggregatorInner<E>>,
}

struct AggregatorInner<E> {
    pending: Mutex<Vec<E>>,
    additions: Notify,
}

impl<E> EventAggregator<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AggregatorInner {
                pending: Mutex::new(Vec::new()),
                additions: Notify::new(),
            }),
        }
    }

    // A panicking engine thread must not wedge the workflow; the buffer is
    // a plain Vec and stays consistent across a poisoned lock.
    fn pending(&self) -> MutexGuard<'_, Vec<E>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one event and wake every registered waiter.
    pub fn add_event(&self, event: E) {
        self.pending().push(event);
        self.inner.additions.notify_waiters();
    }

    /// Append a batch, preserving its order, and wake waiters once.
    pub fn add_events<I>(&self, events: I)
    where
        I: IntoIterator<Item = E>,
    {
        let added = {
            let mut pending = self.pending();
            let before = pending.len();
            pending.extend(events);
            pending.len() - before
        };
        if added > 0 {
            trace!(added, "Appended event batch");
            self.inner.additions.notify_waiters();
        }
    }

    /// Number of buffered events. Never blocks on anything but the buffer lock.
    pub fn count(&self) -> usize {
        self.pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Take everything currently buffered without waiting.
    pub fn drain(&self) -> Vec<E> {
        std::mem::take(&mut *self.pending())
    }

    /// Wait until at least `n` events are buffered, then drain and return
    /// all of them (possibly more than `n`).
    ///
    /// There is no timeout. Dropping the returned future abandons the wait
    /// and removes its waiter registration; buffered events are untouched.
    pub async fn await_at_least(&self, n: usize) -> Vec<E> {
        loop {
            let notified = self.inner.additions.notified();
            tokio::pin!(notified);
            // Registered before the count check, so an addition landing
            // between the check and the await still wakes this waiter.
            notified.as_mut().enable();

            {
                let mut pending = self.pending();
                if pending.len() >= n {
                    return std::mem::take(&mut *pending);
                }
                trace!(have = pending.len(), want = n, "Waiting for more events");
            }

            notified.await;
        }
    }
}

impl<E> Default for EventAggregator<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for EventAggregator<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Send> EventHandler<E> for EventAggregator<E> {
    fn handle_event(&self, event: E) {
        self.add_event(event);
    }
}
