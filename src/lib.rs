//! Cross-platform reading of another local process's memory, and locating
//! masked byte signatures and pointer chains within it.
//!
//! The crate never writes to a target, never injects code, never resolves
//! symbols and never attaches as a debugger: it only opens a process handle
//! with read-only rights and copies bytes out of it. See [`process::Process`]
//! for the entry point, [`pattern`]/[`signature`] for locating a byte
//! sequence, and [`offsets`] for walking a pointer chain from there.

mod abstract_process;
pub mod cache_hint;
pub mod capability;
pub mod daemon;
pub mod error;
pub mod offsets;
pub mod pattern;
pub mod process;
pub mod ptr_width;
pub mod region;
pub mod signature;

pub use cache_hint::CacheHint;
pub use capability::{CacheHintSource, Pod, ProcessLifecycle, ReadMemory};
pub use daemon::SingleProcessDaemon;
pub use error::PatternError;
pub use offsets::Offsets;
pub use pattern::{DynamicPattern, Pattern, PatternElement, StaticPattern};
pub use process::{Pid, Process};
pub use ptr_width::PtrWidth;
pub use region::Region;
pub use signature::{DynamicSignature, Signature, StaticSignature};
