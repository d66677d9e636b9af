//! Byte-wise access to read-only memory regions.
//!
//! Label data on small MCUs usually lives in program memory, which on
//! Harvard-architecture parts is not reachable through an ordinary pointer
//! dereference. Everything that scans packed tables therefore goes through
//! [`ReadOnlyMemory::read_byte`] instead of slice indexing, so a target can
//! plug in whatever load instruction its flash requires.

/// A read-only region that can only be read one byte at a time.
pub trait ReadOnlyMemory {
    /// Reads the byte at `offset`, or `None` past the end of the region.
    fn read_byte(&self, offset: usize) -> Option<u8>;

    /// Size of the region in bytes.
    fn size(&self) -> usize;
}

impl ReadOnlyMemory for [u8] {
    #[inline]
    fn read_byte(&self, offset: usize) -> Option<u8> {
        self.get(offset).copied()
    }

    #[inline]
    fn size(&self) -> usize {
        self.len()
    }
}

impl<const N: usize> ReadOnlyMemory for [u8; N] {
    #[inline]
    fn read_byte(&self, offset: usize) -> Option<u8> {
        self.get(offset).copied()
    }

    #[inline]
    fn size(&self) -> usize {
        N
    }
}

impl<T: ReadOnlyMemory + ?Sized> ReadOnlyMemory for &T {
    #[inline]
    fn read_byte(&self, offset: usize) -> Option<u8> {
        (**self).read_byte(offset)
    }

    #[inline]
    fn size(&self) -> usize {
        (**self).size()
    }
}

/// A flash-resident byte region read with explicit single-byte volatile loads.
///
/// The compiler may not merge, widen or cache these reads, which mirrors
/// how program memory has to be accessed on parts where flash is not part of
/// the data address space.
///
/// # Examples
///
/// ```rust
/// use flash_fsm_core::{ProgMem, ReadOnlyMemory};
///
/// static LABELS: [u8; 4] = *b"on\0\0";
/// let flash = ProgMem::new(&LABELS);
/// assert_eq!(flash.read_byte(1), Some(b'n'));
/// assert_eq!(flash.read_byte(4), None);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ProgMem<'a> {
    bytes: &'a [u8],
}

impl<'a> ProgMem<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl ReadOnlyMemory for ProgMem<'_> {
    #[inline]
    fn read_byte(&self, offset: usize) -> Option<u8> {
        if offset >= self.bytes.len() {
            return None;
        }
        // SAFETY: `offset` was bounds-checked above, so the pointer stays inside
        // the borrowed slice, which is valid and immutable for `'a`.
        let byte = unsafe { core::ptr::read_volatile(self.bytes.as_ptr().add(offset)) };
        Some(byte)
    }

    #[inline]
    fn size(&self) -> usize {
        self.bytes.len()
    }
}
