//! Shared, non-platform-specific logic backing every [`crate::Process`].
//!
//! Rust has no implementation inheritance, so this is a plain struct each
//! platform's `Process` embeds as a field and delegates to, rather than a
//! base class the platform types would otherwise inherit from.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::cache_hint::{allocate_cache_hint, CacheHint, NO_PROCESS};

/// How often [`ProcessCore::wait_until_exit`] re-checks liveness while
/// blocked. Bounds interrupt latency, per spec §4.3/§5.
const POLL_PERIOD: Duration = Duration::from_millis(100);

struct CoreState {
    cache_hint: CacheHint,
    interrupted: bool,
}

/// Owns the cache-hint slot and the condition variable pair used by
/// `wait_until_exit`/`interrupt_synchronize`. Embedded by every platform
/// `Process` implementation.
pub(crate) struct ProcessCore {
    state: Mutex<CoreState>,
    condvar: Condvar,
}

impl ProcessCore {
    /// A core with no process held (`cache_hint == 0`).
    pub(crate) fn empty() -> Self {
        Self {
            state: Mutex::new(CoreState {
                cache_hint: NO_PROCESS,
                interrupted: false,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Allocates a fresh cache hint for a just-opened process and records
    /// it. Clears any prior sticky interrupt, since a new process is now
    /// held.
    pub(crate) fn mark_opened(&self) -> CacheHint {
        let hint = allocate_cache_hint();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.cache_hint = hint;
        state.interrupted = false;
        hint
    }

    pub(crate) fn cache_hint(&self) -> CacheHint {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).cache_hint
    }

    /// Sticky: sets the interrupt flag and wakes every waiter. Idempotent.
    pub(crate) fn interrupt_synchronize(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.interrupted = true;
        self.condvar.notify_all();
    }

    /// Blocks until `is_alive()` returns `false` or until interrupted,
    /// polling at `POLL_PERIOD` intervals. Returns immediately if no
    /// process is held, or if already interrupted.
    pub(crate) fn wait_until_exit(&self, is_alive: impl Fn() -> bool) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.cache_hint == NO_PROCESS {
            return;
        }
        loop {
            if state.interrupted || !is_alive() {
                return;
            }
            let (guard, _timed_out) = self
                .condvar
                .wait_timeout(state, POLL_PERIOD)
                .unwrap_or_else(|e| e.into_inner());
            state = guard;
        }
    }
}

impl Drop for ProcessCore {
    fn drop(&mut self) {
        // Interrupt before any handle this core is embedded next to is
        // released by the rest of `Drop` on the owning `Process`.
        self.interrupt_synchronize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn wait_returns_immediately_with_no_process_held() {
        let core = ProcessCore::empty();
        let start = Instant::now();
        core.wait_until_exit(|| true);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn interrupt_wakes_a_blocked_waiter_promptly() {
        let core = Arc::new(ProcessCore::empty());
        core.mark_opened();
        let alive = Arc::new(AtomicBool::new(true));

        let waiter_core = core.clone();
        let waiter_alive = alive.clone();
        let start = Instant::now();
        let handle = std::thread::spawn(move || {
            waiter_core.wait_until_exit(|| waiter_alive.load(Ordering::SeqCst));
        });

        std::thread::sleep(Duration::from_millis(50));
        core.interrupt_synchronize();
        handle.join().unwrap();

        // Interrupt should unblock well under one polling period on top of
        // the artificial 50ms delay above.
        assert!(start.elapsed() < Duration::from_millis(200));
    }
}
