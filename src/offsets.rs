//! A chain of signed pointer offsets, resolved against a caller-chosen
//! target pointer width and ending in a typed read.

use crate::capability::{Pod, ReadMemory};
use crate::ptr_width::PtrWidth;

/// A chain of `K >= 1` signed offsets applied to a base address.
///
/// Reading with [`Offsets::read`] dereferences `K - 1` intermediate
/// pointers and finishes with a typed read: `read::<T>(B + o_1)` for
/// `K == 1`, or `read::<T>(read_pointer(... read_pointer(B + o_1) ... ) + o_k)`
/// for larger chains. Any intermediate absence short-circuits the whole
/// chain to `None`.
#[derive(Debug, Clone, Copy)]
pub struct Offsets<const K: usize> {
    offsets: [isize; K],
}

impl<const K: usize> Offsets<K> {
    pub const fn new(offsets: [isize; K]) -> Self {
        if K == 0 {
            panic!("an offsets chain must have at least one offset");
        }
        Self { offsets }
    }

    /// Walks the chain from `base` at pointer `width`, returning the
    /// address of the final dereference without performing the last typed
    /// read. Used by both [`Offsets::read`] and [`Offsets::read_pointer`].
    fn resolve_final_address<R: ReadMemory>(&self, reader: &R, base: usize, width: PtrWidth) -> Option<usize> {
        let mut addr = base;
        let (intermediate, last) = self.offsets.split_at(self.offsets.len() - 1);
        for &offset in intermediate {
            addr = apply_offset(addr, offset);
            addr = reader.read_pointer(addr, width)? as usize;
        }
        Some(apply_offset(addr, last[0]))
    }

    /// Resolves the chain and reads a value of type `T` at its end.
    pub fn read<R, T>(&self, reader: &R, base: usize, width: PtrWidth) -> Option<T>
    where
        R: ReadMemory,
        T: Pod,
    {
        let addr = self.resolve_final_address(reader, base, width)?;
        reader.read(addr)
    }

    /// Resolves the chain and reads the value at its end as a pointer at
    /// `width`, zero-extended to a host-sized integer.
    pub fn read_pointer<R: ReadMemory>(&self, reader: &R, base: usize, width: PtrWidth) -> Option<u64> {
        let addr = self.resolve_final_address(reader, base, width)?;
        reader.read_pointer(addr, width)
    }
}

fn apply_offset(addr: usize, offset: isize) -> usize {
    if offset >= 0 {
        addr.wrapping_add(offset as usize)
    } else {
        addr.wrapping_sub(offset.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;

    struct FlatReader {
        base: usize,
        data: Vec<u8>,
    }

    impl ReadMemory for FlatReader {
        fn read_to_buf(&self, addr: usize, buf: &mut [u8]) -> bool {
            if addr < self.base {
                return false;
            }
            let offset = addr - self.base;
            if offset + buf.len() > self.data.len() {
                return false;
            }
            buf.copy_from_slice(&self.data[offset..offset + buf.len()]);
            true
        }

        fn regions(&self) -> Vec<Region> {
            vec![Region {
                base: self.base,
                size: self.data.len(),
            }]
        }
    }

    #[test]
    fn single_offset_is_a_plain_typed_read() {
        let mut data = vec![0u8; 16];
        data[8..12].copy_from_slice(&114_514i32.to_le_bytes());
        let reader = FlatReader { base: 0x1000, data };

        let offsets = Offsets::new([8]);
        let value: Option<i32> = offsets.read(&reader, 0x1000, PtrWidth::Native);
        assert_eq!(value, Some(114_514));
    }

    #[test]
    fn negative_offsets_walk_backward() {
        let mut data = vec![0u8; 16];
        data[4..8].copy_from_slice(&42i32.to_le_bytes());
        let reader = FlatReader { base: 0x1000, data };

        let offsets = Offsets::new([-4isize]);
        let value: Option<i32> = offsets.read(&reader, 0x1008, PtrWidth::Native);
        assert_eq!(value, Some(42));
    }

    #[test]
    fn multi_level_chain_dereferences_each_pointer() {
        // base -> [ptr to level1] -> [ptr to level2] -> value
        let mut data = vec![0u8; 64];
        let base = 0x2000usize;
        let level1 = base + 32;
        let level2 = base + 48;

        data[0..8].copy_from_slice(&(level1 as u64).to_le_bytes());
        data[32..40].copy_from_slice(&(level2 as u64).to_le_bytes());
        data[48..52].copy_from_slice(&7i32.to_le_bytes());

        let reader = FlatReader { base, data };
        let offsets = Offsets::new([0, 0, 0]);
        let value: Option<i32> = offsets.read(&reader, base, PtrWidth::Width64);
        assert_eq!(value, Some(7));
    }

    #[test]
    fn absent_intermediate_pointer_short_circuits_to_none() {
        let data = vec![0u8; 8];
        let reader = FlatReader { base: 0x3000, data };
        let offsets = Offsets::new([0, 4]);
        let value: Option<i32> = offsets.read(&reader, 0x3000, PtrWidth::Width64);
        // The intermediate pointer read is in-bounds but its dereferenced
        // target (address 0) is not covered by the mock's single region.
        assert_eq!(value, None);
    }
}
