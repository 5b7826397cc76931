//! The width of a pointer value as stored in the *target* process, which
//! may differ from the host's own pointer width.

/// Width in bytes of a pointer value read from the target process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PtrWidth {
    /// A 32-bit pointer value in the target.
    Width32,
    /// A 64-bit pointer value in the target.
    Width64,
    /// The host's own pointer width. Only valid when the target *is* the
    /// current process; mixing this with a foreign-width target is
    /// undefined at the contract level (see spec §3, `PtrWidth`).
    Native,
}

impl PtrWidth {
    /// Size in bytes of a pointer value at this width.
    #[inline]
    pub fn size(self) -> usize {
        match self {
            PtrWidth::Width32 => 4,
            PtrWidth::Width64 => 8,
            PtrWidth::Native => std::mem::size_of::<usize>(),
        }
    }
}
