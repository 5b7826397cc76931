//! The capability traits that `Process` and `SingleProcessDaemon` both
//! implement: reading memory, reporting a cache hint, and reporting/waiting
//! on liveness. Modeled as small traits rather than a class hierarchy —
//! there is no deep inheritance here, just three independent contracts a
//! concrete type can satisfy together.

use crate::cache_hint::CacheHint;
use crate::ptr_width::PtrWidth;
use crate::region::Region;

/// Marker for types that are valid for every possible bit pattern of their
/// size, so a raw byte copy from another process's memory can never produce
/// an invalid value.
///
/// # Safety
///
/// Every bit pattern of `size_of::<Self>()` bytes must be a valid value of
/// `Self`. Do not implement this for types with padding, niches, or
/// enum-like invariants.
pub unsafe trait Pod: Copy {}

macro_rules! impl_pod {
    ($($t:ty),* $(,)?) => {
        $(unsafe impl Pod for $t {})*
    };
}

impl_pod!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

/// Reads bytes, typed values and pointers out of a target process, and
/// enumerates its executable memory regions.
///
/// Every operation here is a total function: failures (target died,
/// permission lost, page unmapped) degrade to "absent" rather than
/// signalling an error. Callers distinguish the reasons, if they care, via
/// a subsequent [`crate::ProcessLifecycle::still_alive`] check.
pub trait ReadMemory {
    /// Reads exactly `buf.len()` bytes from `addr`, returning `true` only
    /// if every byte was transferred. On `false`, `buf`'s contents must be
    /// treated as garbage.
    fn read_to_buf(&self, addr: usize, buf: &mut [u8]) -> bool;

    /// A snapshot of the target's currently executable+readable committed
    /// regions, in the platform's natural enumeration order. Returns an
    /// empty vector on failure.
    fn regions(&self) -> Vec<Region>;

    /// Reads `n` bytes starting at `addr`. Returns an empty vector on any
    /// failure (including a partial read).
    fn read_bytes(&self, addr: usize, n: usize) -> Vec<u8> {
        let mut buf = vec![0u8; n];
        if self.read_to_buf(addr, &mut buf) {
            buf
        } else {
            Vec::new()
        }
    }

    /// Reads one plain, fixed-layout value of type `T`.
    fn read<T: Pod>(&self, addr: usize) -> Option<T> {
        let mut value = std::mem::MaybeUninit::<T>::zeroed();
        // Safety: `T: Pod` guarantees any bit pattern of this size is a
        // valid `T`, and the slice below is exactly `size_of::<T>()` bytes
        // pointing at `value`'s own storage.
        let buf = unsafe {
            std::slice::from_raw_parts_mut(value.as_mut_ptr().cast::<u8>(), std::mem::size_of::<T>())
        };
        if self.read_to_buf(addr, buf) {
            // Safety: fully written by the successful `read_to_buf` above.
            Some(unsafe { value.assume_init() })
        } else {
            None
        }
    }

    /// Reads a `width`-byte pointer value and zero-extends it to a
    /// host-sized integer.
    fn read_pointer(&self, addr: usize, width: PtrWidth) -> Option<u64> {
        let size = width.size();
        debug_assert!(size <= 8, "pointer width wider than 8 bytes is not supported");
        let mut buf = [0u8; 8];
        if !self.read_to_buf(addr, &mut buf[..size]) {
            return None;
        }
        Some(u64::from_le_bytes(buf))
    }
}

/// Reports an opaque integer that changes whenever the underlying process
/// identity changes (restart, or a daemon reopening a different target).
pub trait CacheHintSource {
    fn get_cache_hint(&self) -> CacheHint;
}

/// Liveness checks and an interruptible blocking wait.
pub trait ProcessLifecycle {
    /// Reentrant, observational. `false` when no process is held, or when
    /// the PID has been reused by an unrelated process.
    fn still_alive(&self) -> bool;

    /// Blocks until either the held process exits or
    /// [`ProcessLifecycle::interrupt_synchronize`] is called. Returns
    /// immediately if no process is held.
    fn wait_until_exit(&self);

    /// Sets a sticky interrupt flag and wakes all waiters. Idempotent.
    fn interrupt_synchronize(&self);
}
