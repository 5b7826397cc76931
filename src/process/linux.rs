//! Linux/Android `Process` backend.
//!
//! Reads use [`process_vm_readv`](https://linux.die.net/man/2/process_vm_readv)
//! directly (this crate never falls back to `/proc/<pid>/mem` or ptrace: it
//! does not assume the consumer has ptrace permissions on the target, only
//! the ability to observe it). Regions and restart-discriminators come from
//! `/proc/<pid>/maps` and `/proc/<pid>/stat` respectively.

use super::Pid;
use crate::abstract_process::ProcessCore;
use crate::cache_hint::CacheHint;
use crate::capability::{CacheHintSource, ProcessLifecycle, ReadMemory};
use crate::region::Region;

/// A handle to a process on the local machine, opened by PID or by
/// executable name.
pub struct Process {
    core: ProcessCore,
    pid: Option<Pid>,
    /// Start time (in clock ticks, `/proc/<pid>/stat` field 22), captured
    /// at open time. Distinguishes "still the process we opened" from "a
    /// new process that happens to reuse the same PID".
    start_time: Option<u64>,
}

/// Parses field 22 (start time) out of the contents of `/proc/<pid>/stat`.
///
/// The `comm` field (2nd field) is parenthesized and may itself contain
/// whitespace or parentheses, so this splits on the *last* `)` rather than
/// naively on whitespace, matching the approach `man proc` recommends.
fn parse_stat_start_time(contents: &str) -> Option<u64> {
    let close_paren = contents.rfind(')')?;
    let rest = contents.get(close_paren + 1..)?;
    // `rest` begins with field 3 (state); field 22 is 19 fields further on.
    rest.split_whitespace().nth(19)?.parse().ok()
}

impl Process {
    /// A `Process` holding nothing: `still_alive()` is `false`, every read
    /// fails, `get_cache_hint()` is `0`.
    pub fn empty() -> Self {
        Self {
            core: ProcessCore::empty(),
            pid: None,
            start_time: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pid.is_none()
    }

    /// Opens the calling process. Always succeeds.
    pub fn try_from_current_process() -> Self {
        Self::try_from_pid(std::process::id())
    }

    /// Opens the given PID, capturing its start time as the restart
    /// discriminator. Yields an empty `Process` if `/proc/<pid>/stat`
    /// can't be read or parsed.
    pub fn try_from_pid(pid: Pid) -> Self {
        let contents = match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(contents) => contents,
            Err(err) => {
                log::debug!("failed to open /proc/{pid}/stat: {err}");
                return Self::empty();
            }
        };

        let Some(start_time) = parse_stat_start_time(&contents) else {
            log::warn!("failed to parse /proc/{pid}/stat");
            return Self::empty();
        };

        let core = ProcessCore::empty();
        core.mark_opened();
        Self {
            core,
            pid: Some(pid),
            start_time: Some(start_time),
        }
    }

    /// Enumerates `/proc`, returning the first process whose
    /// `/proc/<pid>/exe` basename matches `name`. "First" is whatever order
    /// `read_dir` yields, which is platform-defined and unordered; callers
    /// with multiple matches must disambiguate themselves.
    pub fn try_from_process_name(name: &str) -> Self {
        let Ok(entries) = std::fs::read_dir("/proc") else {
            return Self::empty();
        };

        for entry in entries.flatten() {
            let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse::<Pid>().ok()) else {
                continue;
            };

            let Ok(target) = std::fs::read_link(format!("/proc/{pid}/exe")) else {
                continue;
            };

            if target.file_name().and_then(|f| f.to_str()) == Some(name) {
                return Self::try_from_pid(pid);
            }
        }

        Self::empty()
    }
}

impl ReadMemory for Process {
    fn read_to_buf(&self, addr: usize, buf: &mut [u8]) -> bool {
        let Some(pid) = self.pid else {
            return false;
        };
        if buf.is_empty() {
            return true;
        }

        let remote = [nix::sys::uio::RemoteIoVec {
            base: addr,
            len: buf.len(),
        }];
        let mut local = [std::io::IoSliceMut::new(buf)];

        match nix::sys::uio::process_vm_readv(nix::unistd::Pid::from_raw(pid as i32), &mut local, &remote) {
            Ok(n) => n == remote[0].len,
            Err(err) => {
                log::debug!("process_vm_readv failed for pid {pid} at {addr:#x}: {err}");
                false
            }
        }
    }

    fn regions(&self) -> Vec<Region> {
        let Some(pid) = self.pid else {
            return Vec::new();
        };

        let contents = match std::fs::read_to_string(format!("/proc/{pid}/maps")) {
            Ok(contents) => contents,
            Err(err) => {
                log::debug!("failed to open /proc/{pid}/maps: {err}");
                return Vec::new();
            }
        };

        let mut regions = Vec::new();
        for line in contents.lines() {
            let mut fields = line.split_whitespace();
            let (Some(addr_range), Some(perms)) = (fields.next(), fields.next()) else {
                continue;
            };

            let perm_bytes = perms.as_bytes();
            let executable_and_readable = perm_bytes.len() >= 3 && perm_bytes[0] == b'r' && perm_bytes[2] == b'x';
            if !executable_and_readable {
                continue;
            }

            let Some((start_str, end_str)) = addr_range.split_once('-') else {
                continue;
            };
            let (Ok(start), Ok(end)) = (
                usize::from_str_radix(start_str, 16),
                usize::from_str_radix(end_str, 16),
            ) else {
                continue;
            };

            regions.push(Region {
                base: start,
                size: end - start,
            });
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
        let (Some(pid), Some(expected_start_time)) = (self.pid, self.start_time) else {
            return false;
        };

        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(contents) => parse_stat_start_time(&contents) == Some(expected_start_time),
            Err(_) => false,
        }
    }

    fn wait_until_exit(&self) {
        self.core.wait_until_exit(|| self.still_alive());
    }

    fn interrupt_synchronize(&self) {
        self.core.interrupt_synchronize();
    }
}
