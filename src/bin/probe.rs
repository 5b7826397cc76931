// This binary shouldn't be under /src, but under /tests, but that is
// currently not possible (https://github.com/rust-lang/cargo/issues/4356)
//
// A small long-running process integration tests spawn, open by PID or by
// name, and scan for the byte pattern and pointer chain it prints out.
//
// `regions()` only ever reports executable+readable spans, so the bytes a
// signature test looks for have to actually live in `.text`, not on the
// heap. `NEEDLE` is pinned there with `link_section`; everything else a
// test reads directly by address (no scan involved) is free to live in an
// ordinary heap buffer.

use std::io::BufRead;

/// `11 45 14 ??` matches at `NEEDLE`'s own address.
#[used]
#[link_section = ".text"]
static NEEDLE: [u8; 4] = [0x11, 0x45, 0x14, 0x00];

struct Probe {
    buf: Box<[u8; 64]>,
    // A pointer into `buf`, stored in the probe's own memory so an offsets
    // chain test can dereference it and land back inside `buf`.
    self_ptr: *const u8,
}

fn main() {
    let mut buf = Box::new([0u8; 64]);
    buf[40..48].copy_from_slice(&0xDEAD_BEEF_i64.to_le_bytes());

    let probe = Probe {
        self_ptr: buf.as_ptr(),
        buf,
    };

    println!("pid={}", std::process::id());
    println!("buf_addr={}", probe.buf.as_ptr() as usize);
    println!("self_ptr_addr={}", std::ptr::addr_of!(probe.self_ptr) as usize);
    println!("needle_addr={}", std::ptr::addr_of!(NEEDLE) as usize);
    println!("ready");

    // Block until the parent test closes our stdin, which is the signal to
    // exit (and thus to let `still_alive`/`wait_until_exit` observers see
    // the process go away).
    let stdin = std::io::stdin();
    let mut line = String::new();
    let _ = stdin.lock().read_line(&mut line);
}
