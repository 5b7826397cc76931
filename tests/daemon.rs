mod common;
use common::Probe;

use memory_reader::{CacheHintSource, ProcessLifecycle, ReadMemory, SingleProcessDaemon};

#[test]
fn daemon_opens_a_spawned_process_by_name_and_reads_it() {
    let probe = Probe::spawn();
    let name = std::path::Path::new(env!("CARGO_BIN_EXE_probe"))
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    // Name-based matching picks whichever match the platform enumerates
    // first, so if another `probe` happens to be running concurrently this
    // could observe that one instead of ours: this only asserts properties
    // true of *any* live probe, never memory specific to this instance.
    let daemon = SingleProcessDaemon::new(name);

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    while !daemon.still_alive() && std::time::Instant::now() < deadline {
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    assert!(daemon.still_alive());
    assert_ne!(daemon.get_cache_hint(), memory_reader::cache_hint::NO_PROCESS);
    assert!(!daemon.regions().is_empty());

    probe.kill_and_wait();
}

#[test]
fn daemon_with_no_match_never_reports_alive() {
    let daemon = SingleProcessDaemon::new("a-process-name-that-should-never-exist-xyz");
    std::thread::sleep(std::time::Duration::from_millis(200));
    assert!(!daemon.still_alive());
}
