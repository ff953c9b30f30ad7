//! Blocking park/unpark primitive for OS threads.
//!
//! A binary permit: `unpark` stores the permit, `park` consumes it,
//! blocking until one is available. A wake that lands before the target
//! actually blocks is therefore never lost.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Inner {
    permit: Mutex<bool>,
    cvar: Condvar,
}

/// Cloneable handle to one thread's park slot.
#[derive(Debug, Clone, Default)]
pub struct Parker(Arc<Inner>);

impl Parker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until a permit is available, then consume it.
    pub fn park(&self) {
        let mut permit = self.0.permit.lock().unwrap_or_else(PoisonError::into_inner);
        while !*permit {
            permit = self
                .0
                .cvar
                .wait(permit)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *permit = false;
    }

    /// Like [`park`](Self::park) but gives up after `timeout`.
    ///
    /// Returns `true` if a permit was consumed.
    pub fn park_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut permit = self.0.permit.lock().unwrap_or_else(PoisonError::into_inner);
        while !*permit {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            permit = self
                .0
                .cvar
                .wait_timeout(permit, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *permit = false;
        true
    }

    /// Make a permit available, waking the parked thread if any.
    pub fn unpark(&self) {
        let mut permit = self.0.permit.lock().unwrap_or_else(PoisonError::into_inner);
        *permit = true;
        drop(permit);
        self.0.cvar.notify_one();
    }

    /// Whether two handles refer to the same park slot.
    pub fn same_as(&self, other: &Parker) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
