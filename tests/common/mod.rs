// Spawns the `probe` helper binary via `CARGO_BIN_EXE_probe` and parses the
// handful of facts it prints about itself on startup.

use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

pub struct Probe {
    pub child: Child,
    pub pid: u32,
    pub buf_addr: usize,
    pub self_ptr_addr: usize,
    pub needle_addr: usize,
    stdin: ChildStdin,
}

impl Probe {
    pub fn spawn() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let path = env!("CARGO_BIN_EXE_probe");
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .expect("failed to spawn probe binary");

        let stdin = child.stdin.take().expect("probe has no stdin");
        let stdout = child.stdout.take().expect("probe has no stdout");
        let mut lines = BufReader::new(stdout).lines();

        let pid = parse_field(&mut lines, "pid=");
        let buf_addr = parse_field(&mut lines, "buf_addr=");
        let self_ptr_addr = parse_field(&mut lines, "self_ptr_addr=");
        let needle_addr = parse_field(&mut lines, "needle_addr=");
        let ready = lines.next().expect("probe closed stdout early").unwrap();
        assert_eq!(ready, "ready");

        Self {
            child,
            pid,
            buf_addr,
            self_ptr_addr,
            needle_addr,
            stdin,
        }
    }

    /// Signals the probe to exit by closing its stdin, then waits for it.
    pub fn kill_and_wait(mut self) {
        drop(self.stdin);
        let _ = self.child.wait();
    }
}

fn parse_field(lines: &mut std::io::Lines<BufReader<ChildStdout>>, prefix: &str) -> usize {
    let line = lines
        .next()
        .unwrap_or_else(|| panic!("probe closed stdout before printing {prefix}"))
        .unwrap();
    line.strip_prefix(prefix)
        .unwrap_or_else(|| panic!("expected line starting with {prefix}, got {line:?}"))
        .parse()
        .unwrap_or_else(|_| panic!("{prefix} line was not a valid number: {line:?}"))
}

impl Drop for Probe {
    fn drop(&mut self) {
        // Best-effort: a test that already consumed `self` via
        // `kill_and_wait` never reaches here with a live child, but one
        // that panics mid-test still shouldn't leak a process.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
