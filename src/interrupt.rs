//! Per-worker cancellation token for blocking waits.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::error::Interrupted;

struct InterruptState {
    pending: Mutex<bool>,
    signal: Condvar,
}

/// A cloneable interrupt flag. Raising it wakes an `Interrupt::sleep` in
/// progress immediately; channel waits notice it within their check slice.
///
/// Observing the interrupt consumes it, so one `raise` aborts exactly one
/// blocking operation.
#[derive(Clone)]
pub struct Interrupt {
    inner: Arc<InterruptState>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(InterruptState {
                pending: Mutex::new(false),
                signal: Condvar::new(),
            }),
        }
    }

    /// Deliver an interrupt to whoever owns this token.
    pub fn raise(&self) {
        let mut pending = self.inner.pending.lock().expect("interrupt mutex poisoned");
        *pending = true;
        self.inner.signal.notify_all();
    }

    /// Consume a pending interrupt, returning whether one was set.
    pub fn take(&self) -> bool {
        let mut pending = self.inner.pending.lock().expect("interrupt mutex poisoned");
        std::mem::replace(&mut *pending, false)
    }

    #[allow(dead_code)]
    pub fn is_raised(&self) -> bool {
        *self.inner.pending.lock().expect("interrupt mutex poisoned")
    }

    /// Sleep for `duration` unless interrupted first.
    pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let pending = self.inner.pending.lock().expect("interrupt mutex poisoned");
        let (mut pending, _) = self
            .inner
            .signal
            .wait_timeout_while(pending, duration, |raised| !*raised)
            .expect("interrupt condvar wait failed");
        if *pending {
            *pending = false;
            return Err(Interrupted);
        }
        Ok(())
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}
