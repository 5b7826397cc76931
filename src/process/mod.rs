//! Platform dispatch for [`Process`], via a `cfg_if` conditional-compilation
//! split between the OS-specific backends.

/// Platform process identifier.
pub type Pid = u32;

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "android"))] {
        mod linux;
        pub use linux::Process;
    } else if #[cfg(target_os = "windows")] {
        mod windows;
        pub use windows::Process;
    } else {
        compile_error!("memory-reader has no Process backend for this target platform");
    }
}
