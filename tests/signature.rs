mod common;
use common::Probe;

use memory_reader::{DynamicPattern, DynamicSignature, Process, StaticPattern, StaticSignature};

#[test]
fn static_signature_finds_the_probes_marker_bytes() {
    let probe = Probe::spawn();
    let process = Process::try_from_pid(probe.pid);

    const PATTERN: StaticPattern<4> = StaticPattern::new("11 45 14 ??");
    let signature: StaticSignature<4> = StaticSignature::new(PATTERN);

    let found = signature.scan(&process);
    assert_eq!(found, Some(probe.needle_addr));

    probe.kill_and_wait();
}

#[test]
fn dynamic_signature_caches_across_repeated_scans() {
    let probe = Probe::spawn();
    let process = Process::try_from_pid(probe.pid);

    let pattern = DynamicPattern::new("11 45 14").unwrap();
    let signature = DynamicSignature::new(pattern);

    let first = signature.scan(&process);
    let second = signature.scan(&process);
    assert_eq!(first, second);
    assert_eq!(first, Some(probe.needle_addr));

    probe.kill_and_wait();
}

#[test]
fn signature_against_a_dead_process_finds_nothing() {
    let probe = Probe::spawn();
    let process = Process::try_from_pid(probe.pid);
    probe.kill_and_wait();

    let pattern = DynamicPattern::new("11 45 14").unwrap();
    let signature = DynamicSignature::new(pattern);
    assert_eq!(signature.scan(&process), None);
}
