//! Bounded FIFO handoff between the producer and the consumer.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{PutError, TakeError};
use crate::interrupt::Interrupt;

// How often a blocked put/take re-checks its interrupt token.
const INTERRUPT_CHECK_MS: u64 = 25;

/// A fixed-capacity, synchronized FIFO queue.
pub struct BoundedChannel<T> {
    inner: Mutex<ChannelState<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

struct ChannelState<T> {
    queue: VecDeque<T>,
    closed: bool,
    peak: usize,
}

impl<T> BoundedChannel<T> {
    /// Create an empty channel. Capacity must be non-zero.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "capacity must be > 0");
        Self {
            inner: Mutex::new(ChannelState {
                queue: VecDeque::with_capacity(capacity),
                closed: false,
                peak: 0,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChannelState<T>> {
        self.inner.lock().expect("channel mutex poisoned")
    }

    /// Block while full, then append to the tail.
    #[allow(dead_code)]
    pub fn put(&self, item: T, interrupt: &Interrupt) -> Result<(), PutError<T>> {
        self.put_then(item, interrupt, || {})
    }

    /// Like `put`, but runs `on_enqueued` under the channel lock once the item
    /// is queued, before any consumer can observe it.
    pub fn put_then<F>(&self, item: T, interrupt: &Interrupt, on_enqueued: F) -> Result<(), PutError<T>>
    where
        F: FnOnce(),
    {
        let mut guard = self.lock();
        loop {
            if guard.closed {
                return Err(PutError::Closed(item));
            }
            if guard.queue.len() < self.capacity {
                break;
            }
            if interrupt.take() {
                return Err(PutError::Interrupted(item));
            }
            // Wait releases the lock and re-acquires it before returning.
            guard = self
                .not_full
                .wait_timeout(guard, Duration::from_millis(INTERRUPT_CHECK_MS))
                .expect("condvar wait failed")
                .0;
        }
        guard.queue.push_back(item);
        guard.peak = guard.peak.max(guard.queue.len());
        on_enqueued();
        self.not_empty.notify_one();
        Ok(())
    }

    /// Block while empty, then remove and return the head. A closed channel
    /// still hands out whatever it holds before reporting `Closed`.
    pub fn take(&self, interrupt: &Interrupt) -> Result<T, TakeError> {
        let mut guard = self.lock();
        loop {
            if let Some(item) = guard.queue.pop_front() {
                self.not_full.notify_one();
                return Ok(item);
            }
            if guard.closed {
                return Err(TakeError::Closed);
            }
            if interrupt.take() {
                return Err(TakeError::Interrupted);
            }
            guard = self
                .not_empty
                .wait_timeout(guard, Duration::from_millis(INTERRUPT_CHECK_MS))
                .expect("condvar wait failed")
                .0;
        }
    }

    /// Try to pop immediately without blocking.
    #[allow(dead_code)]
    pub fn try_take(&self) -> Option<T> {
        let item = self.lock().queue.pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Close the channel and wake every blocked party.
    pub fn close(&self) {
        let mut guard = self.lock();
        guard.closed = true;
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Current number of queued tasks.
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Largest number of tasks resident at once so far.
    pub fn peak_occupancy(&self) -> usize {
        self.lock().peak
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
