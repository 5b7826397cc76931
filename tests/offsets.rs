mod common;
use common::Probe;

use memory_reader::{Offsets, Process, PtrWidth};

#[test]
fn offsets_chain_dereferences_the_probes_self_pointer() {
    let probe = Probe::spawn();
    let process = Process::try_from_pid(probe.pid);

    // self_ptr_addr holds a pointer to the start of buf; offset 40 within
    // buf holds a known i64. One dereference, then a typed read.
    let offsets: Offsets<2> = Offsets::new([0, 40]);
    let value: Option<i64> = offsets.read(&process, probe.self_ptr_addr, PtrWidth::Native);
    assert_eq!(value, Some(0xDEAD_BEEF_i64));

    probe.kill_and_wait();
}

#[test]
fn single_offset_reads_a_value_directly_from_the_buffer() {
    let probe = Probe::spawn();
    let process = Process::try_from_pid(probe.pid);

    let offsets: Offsets<1> = Offsets::new([40]);
    let value: Option<i64> = offsets.read(&process, probe.buf_addr, PtrWidth::Native);
    assert_eq!(value, Some(0xDEAD_BEEF_i64));

    probe.kill_and_wait();
}
