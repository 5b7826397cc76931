//! Windows `Process` backend.
//!
//! Binds `ReadProcessMemory` and friends directly through raw `windows-sys`
//! FFI rather than through a heavier wrapper crate.

use std::ffi::c_void;

use windows_sys::Win32::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W, TH32CS_SNAPPROCESS,
};
use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use windows_sys::Win32::System::Memory::{
    VirtualQueryEx, MEMORY_BASIC_INFORMATION, MEM_COMMIT, PAGE_EXECUTE_READ, PAGE_EXECUTE_READWRITE,
};
use windows_sys::Win32::System::Threading::{
    GetCurrentProcessId, GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_VM_READ,
    STILL_ACTIVE, SYNCHRONIZE,
};

use super::Pid;
use crate::abstract_process::ProcessCore;
use crate::cache_hint::CacheHint;
use crate::capability::{CacheHintSource, ProcessLifecycle, ReadMemory};
use crate::region::Region;

const DESIRED_ACCESS: u32 = SYNCHRONIZE | PROCESS_QUERY_LIMITED_INFORMATION | PROCESS_VM_READ;

/// A handle to a process on the local machine, opened by PID or by
/// executable name.
///
/// Unlike the POSIX backend, no separate restart-discriminator needs to be
/// captured: a Windows `HANDLE` refers to a specific kernel process object
/// for as long as it is held open, so PID reuse can never be mistaken for
/// "still the same process" here the way it could from a bare PID.
pub struct Process {
    core: ProcessCore,
    handle: HANDLE,
    pid: Option<Pid>,
}

// `HANDLE` is an opaque kernel object reference; it is safe to use from any
// thread as long as access is otherwise synchronized the way the rest of
// this type already is via `ProcessCore`.
unsafe impl Send for Process {}
unsafe impl Sync for Process {}

fn wide_to_basename(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}

impl Process {
    /// A `Process` holding nothing: `still_alive()` is `false`, every read
    /// fails, `get_cache_hint()` is `0`.
    pub fn empty() -> Self {
        Self {
            core: ProcessCore::empty(),
            handle: 0,
            pid: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pid.is_none()
    }

    /// Opens the calling process. Always succeeds.
    pub fn try_from_current_process() -> Self {
        // SAFETY: FFI call with no preconditions.
        let pid = unsafe { GetCurrentProcessId() };
        Self::try_from_pid(pid)
    }

    /// Opens the given PID with `SYNCHRONIZE | PROCESS_QUERY_LIMITED_INFORMATION
    /// | PROCESS_VM_READ`. Yields an empty `Process` on failure.
    pub fn try_from_pid(pid: Pid) -> Self {
        // SAFETY: FFI call; `pid` may be invalid, which is reported via a
        // null handle rather than being a precondition on us.
        let handle = unsafe { OpenProcess(DESIRED_ACCESS, 0, pid) };
        if handle == 0 {
            log::debug!("OpenProcess failed for pid {pid}");
            return Self::empty();
        }

        let core = ProcessCore::empty();
        core.mark_opened();
        Self {
            core,
            handle,
            pid: Some(pid),
        }
    }

    /// Enumerates running processes via a toolhelp snapshot, returning the
    /// first whose `szExeFile` basename matches `name`. "First" is whatever
    /// order the snapshot yields, which is platform-defined and unordered.
    pub fn try_from_process_name(name: &str) -> Self {
        // SAFETY: FFI call with no preconditions.
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) };
        if snapshot == INVALID_HANDLE_VALUE {
            return Self::empty();
        }

        let mut entry: PROCESSENTRY32W = unsafe { std::mem::zeroed() };
        entry.dwSize = std::mem::size_of::<PROCESSENTRY32W>() as u32;

        let mut found_pid = None;
        // SAFETY: `entry` is correctly sized and zeroed above.
        if unsafe { Process32FirstW(snapshot, &mut entry) } != 0 {
            loop {
                if wide_to_basename(&entry.szExeFile).eq_ignore_ascii_case(name) {
                    found_pid = Some(entry.th32ProcessID);
                    break;
                }
                // SAFETY: same `entry`/`snapshot` as above.
                if unsafe { Process32NextW(snapshot, &mut entry) } == 0 {
                    break;
                }
            }
        }

        // SAFETY: `snapshot` is a valid handle obtained above.
        unsafe { CloseHandle(snapshot) };

        match found_pid {
            Some(pid) => Self::try_from_pid(pid),
            None => Self::empty(),
        }
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        if self.handle != 0 {
            // SAFETY: `self.handle` is a handle we own exclusively, opened
            // by `OpenProcess` above and never shared.
            unsafe {
                CloseHandle(self.handle);
            }
        }
    }
}

impl ReadMemory for Process {
    fn read_to_buf(&self, addr: usize, buf: &mut [u8]) -> bool {
        if self.handle == 0 {
            return false;
        }
        if buf.is_empty() {
            return true;
        }

        let mut bytes_read = 0usize;
        // SAFETY: `self.handle` is a live process handle with
        // `PROCESS_VM_READ`; `buf` is a valid, correctly sized buffer for
        // the duration of the call.
        let ok = unsafe {
            ReadProcessMemory(
                self.handle,
                addr as *const c_void,
                buf.as_mut_ptr().cast::<c_void>(),
                buf.len(),
                &mut bytes_read,
            )
        };

        ok != 0 && bytes_read == buf.len()
    }

    fn regions(&self) -> Vec<Region> {
        if self.handle == 0 {
            return Vec::new();
        }

        let mut regions = Vec::new();
        let mut addr: usize = 0;

        loop {
            let mut info: MEMORY_BASIC_INFORMATION = unsafe { std::mem::zeroed() };
            // SAFETY: `info` is sized for `VirtualQueryEx`'s expected
            // output and `self.handle` is a live, readable process handle.
            let written = unsafe {
                VirtualQueryEx(
                    self.handle,
                    addr as *const c_void,
                    &mut info,
                    std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
                )
            };
            if written == 0 {
                break;
            }

            let executable = info.State == MEM_COMMIT
                && (info.Protect == PAGE_EXECUTE_READ || info.Protect == PAGE_EXECUTE_READWRITE);
            if executable {
                regions.push(Region {
                    base: info.BaseAddress as usize,
                    size: info.RegionSize,
                });
            }

            let Some(next) = (info.BaseAddress as usize).checked_add(info.RegionSize) else {
                break;
            };
            if next <= addr {
                break;
            }
            addr = next;
        }

        regions
    }
}

impl CacheHintSource for Process {
    fn get_cache_hint(&self) -> CacheHint {
        self.core.cache_hint()
    }
}

impl ProcessLifecycle for Process {
    fn still_alive(&self) -> bool {
        if self.handle == 0 {
            return false;
        }
        let mut exit_code: u32 = 0;
        // SAFETY: `self.handle` is a live process handle.
        let ok = unsafe { GetExitCodeProcess(self.handle, &mut exit_code) };
        ok != 0 && exit_code == STILL_ACTIVE as u32
    }

    fn wait_until_exit(&self) {
        self.core.wait_until_exit(|| self.still_alive());
    }

    fn interrupt_synchronize(&self) {
        self.core.interrupt_synchronize();
    }
}
