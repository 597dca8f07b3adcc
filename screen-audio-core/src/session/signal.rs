use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// One-shot value handed from one thread to another.
///
/// The first `complete` wins; later calls are ignored. Waiters block on a
/// condition variable with a deadline instead of spinning.
#[derive(Debug)]
pub struct Completion<T> {
    value: Mutex<Option<T>>,
    done: Mutex<bool>,
    cond: Condvar,
}

impl<T> Completion<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            done: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Returns false if already completed.
    pub fn complete(&self, value: T) -> bool {
        let mut done = self.done.lock();
        if *done {
            return false;
        }
        *self.value.lock() = Some(value);
        *done = true;
        self.cond.notify_all();
        true
    }

    pub fn is_complete(&self) -> bool {
        *self.done.lock()
    }

    /// Wait up to `timeout` and take the value.
    ///
    /// `None` means the deadline passed, or another waiter already took it.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut done = self.done.lock();
        while !*done {
            if self.cond.wait_until(&mut done, deadline).timed_out() {
                break;
            }
        }
        if *done {
            self.value.lock().take()
        } else {
            None
        }
    }
}

impl<T> Default for Completion<T> {
    fn default() -> Self {
        Self::new()
    }
}
