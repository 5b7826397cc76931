//! The process-wide cache-hint counter.
//!
//! A [`CacheHint`] is an opaque integer: only equality ever matters. `0` is
//! reserved to mean "no process held, hint not meaningful". Every
//! successful [`crate::Process`] open allocates a fresh value from one
//! monotonically increasing, process-wide atomic counter, so any reopen
//! (same or different target) is guaranteed to produce a hint distinct
//! from any previously observed one within this host process.

use std::sync::atomic::{AtomicI64, Ordering};

/// Opaque identity token for "the process currently behind this handle".
///
/// Never interpret the value itself; compare two hints only for equality.
pub type CacheHint = i64;

/// `0` is reserved: "no process held".
pub const NO_PROCESS: CacheHint = 0;

static CACHE_HINT_COUNTER: AtomicI64 = AtomicI64::new(1);

/// Allocates a fresh, non-zero cache hint. Safe to call from any thread.
pub fn allocate_cache_hint() -> CacheHint {
    // `fetch_add` on a 64-bit counter starting at 1 will not wrap back
    // through 0 within the lifetime of a host process.
    CACHE_HINT_COUNTER.fetch_add(1, Ordering::SeqCst)
}
