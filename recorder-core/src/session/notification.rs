use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

struct Inner<T> {
    value: Mutex<Option<T>>,
    ready: Condvar,
}

/// One-shot completion handle.
///
/// Fulfilled at most once; every clone observes the same value. `wait`
/// blocks with no timeout, so a stalled worker leaves it waiting forever;
/// use `wait_timeout` where that matters.
pub struct Notification<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Clone> Notification<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                value: Mutex::new(None),
                ready: Condvar::new(),
            }),
        }
    }

    /// Store the value and wake all waiters. Returns `false` if the
    /// notification was already fulfilled; the first value wins.
    pub(crate) fn fulfill(&self, value: T) -> bool {
        let mut slot = self.inner.value.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        drop(slot);
        self.inner.ready.notify_all();
        true
    }

    pub fn is_fulfilled(&self) -> bool {
        self.inner.value.lock().is_some()
    }

    /// The value, if already fulfilled. Never blocks.
    pub fn try_get(&self) -> Option<T> {
        self.inner.value.lock().clone()
    }

    /// Block until fulfilled.
    pub fn wait(&self) -> T {
        let mut slot = self.inner.value.lock();
        loop {
            if let Some(value) = slot.as_ref() {
                return value.clone();
            }
            self.inner.ready.wait(&mut slot);
        }
    }

    /// Block until fulfilled or `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.inner.value.lock();
        loop {
            if let Some(value) = slot.as_ref() {
                return Some(value.clone());
            }
            if self.inner.ready.wait_until(&mut slot, deadline).timed_out() {
                return slot.clone();
            }
        }
    }

    /// Whether both handles refer to the same notification.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for Notification<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Notification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("fulfilled", &self.inner.value.lock().is_some())
            .finish()
    }
}
