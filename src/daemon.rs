//! Background reopen-by-name loop that looks, to its callers, like a single
//! long-lived [`Process`](crate::process::Process).
//!
//! The condition-variable plumbing reuses the same shape
//! [`crate::abstract_process::ProcessCore`] already gives every `Process`.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::cache_hint::CacheHint;
use crate::capability::{CacheHintSource, ProcessLifecycle, ReadMemory};
use crate::process::Process;
use crate::region::Region;

const COOLDOWN: Duration = Duration::from_millis(100);

struct DaemonState {
    desired_name: String,
    should_exit: bool,
}

/// State the background thread owns a strong reference to.
///
/// Kept separate from [`SingleProcessDaemon`] itself: if the worker thread
/// held a strong `Arc<SingleProcessDaemon>`, the daemon's own strong count
/// would never drop to zero while the thread is alive, so `Drop` (the only
/// place that asks the thread to stop) could never run — a caller dropping
/// its `Arc` would just decrement a refcount the thread also holds, and the
/// thread would loop forever. The thread owning only `Arc<Shared>` means the
/// outer `SingleProcessDaemon`'s refcount reflects callers alone, so it drops
/// (and joins the thread) exactly when the last caller drops it.
struct Shared {
    state: Mutex<DaemonState>,
    condvar: Condvar,
    current: Mutex<Arc<Process>>,
}

impl Shared {
    fn snapshot(&self) -> Arc<Process> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn should_exit(&self) -> bool {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).should_exit
    }

    /// Sleeps one cooldown period on the shared condvar, returning `true`
    /// if the daemon should stop instead of looping back to *Opening*.
    fn cool_down_or_exit(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.should_exit {
            return true;
        }
        let (guard, _timed_out) = self
            .condvar
            .wait_timeout(state, COOLDOWN)
            .unwrap_or_else(|e| e.into_inner());
        state = guard;
        state.should_exit
    }

    fn run(&self) {
        loop {
            let name = {
                let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                loop {
                    if state.should_exit {
                        return;
                    }
                    if !state.desired_name.is_empty() {
                        break state.desired_name.clone();
                    }
                    let (guard, _timed_out) = self
                        .condvar
                        .wait_timeout(state, COOLDOWN)
                        .unwrap_or_else(|e| e.into_inner());
                    state = guard;
                }
            };

            let opened = Process::try_from_process_name(&name);
            if opened.is_empty() {
                log::debug!("daemon failed to open process named {name:?}, cooling down");
                if self.cool_down_or_exit() {
                    return;
                }
                continue;
            }

            let opened = Arc::new(opened);
            *self.current.lock().unwrap_or_else(|e| e.into_inner()) = opened.clone();
            opened.wait_until_exit();

            if self.should_exit() {
                return;
            }
            if self.cool_down_or_exit() {
                return;
            }
        }
    }
}

/// A `MemoryReader + CacheHintProvider + ProcessLifecycle` backed by a
/// process that is looked up by name and reopened whenever it exits.
///
/// The polling thread runs: *Idle-with-no-target* (desired name empty) →
/// *Opening* (`try_from_process_name`) → *Running* (`wait_until_exit` on
/// whatever opened) → *Cooling* (sleep up to 100ms) → back to *Opening*.
/// Forwarded reads clone the current `Arc<Process>` under a short-lived
/// lock and then operate on the clone, so a reopen racing with a read can
/// only ever produce a failed syscall (observed as absence), never a torn
/// `Process` value.
pub struct SingleProcessDaemon {
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl SingleProcessDaemon {
    /// Starts the background polling thread. `desired_name` may be empty,
    /// in which case the daemon idles until [`Self::set_process_name`] is
    /// called.
    pub fn new(desired_name: impl Into<String>) -> Arc<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(DaemonState {
                desired_name: desired_name.into(),
                should_exit: false,
            }),
            condvar: Condvar::new(),
            current: Mutex::new(Arc::new(Process::empty())),
        });

        let worker = shared.clone();
        let handle = std::thread::spawn(move || worker.run());

        Arc::new(Self {
            shared,
            thread: Mutex::new(Some(handle)),
        })
    }

    /// Updates the name the daemon looks for on its next *Opening* step.
    /// Does not preempt an in-progress `wait_until_exit`: a caller wanting
    /// immediate redirection must observe liveness itself and, if desired,
    /// interrupt the currently-held process.
    pub fn set_process_name(&self, name: impl Into<String>) {
        let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        state.desired_name = name.into();
        self.shared.condvar.notify_all();
    }

    fn snapshot(&self) -> Arc<Process> {
        self.shared.snapshot()
    }
}

impl Drop for SingleProcessDaemon {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            state.should_exit = true;
            self.shared.condvar.notify_all();
        }
        self.snapshot().interrupt_synchronize();
        let handle = self.thread.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl ReadMemory for SingleProcessDaemon {
    fn read_to_buf(&self, addr: usize, buf: &mut [u8]) -> bool {
        self.snapshot().read_to_buf(addr, buf)
    }

    fn regions(&self) -> Vec<Region> {
        self.snapshot().regions()
    }
}

impl CacheHintSource for SingleProcessDaemon {
    fn get_cache_hint(&self) -> CacheHint {
        self.snapshot().get_cache_hint()
    }
}

impl ProcessLifecycle for SingleProcessDaemon {
    fn still_alive(&self) -> bool {
        self.snapshot().still_alive()
    }

    fn wait_until_exit(&self) {
        self.snapshot().wait_until_exit();
    }

    fn interrupt_synchronize(&self) {
        self.snapshot().interrupt_synchronize();
    }
}
