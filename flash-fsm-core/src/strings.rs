//! Packed, doubly-null-terminated string tables.
//!
//! A packed table is one contiguous read-only buffer holding N null-terminated
//! segments followed by one extra null byte:
//!
//! ```text
//! b"1\0second\0third\0\0"
//!   ^  ^       ^      ^ empty segment ends the table
//! ```
//!
//! [`PackedStringTable::parse`] scans the buffer twice through the
//! [`ReadOnlyMemory`] accessor: once to count the segments, once to record a
//! [`StringHandle`] per segment into a fixed-capacity index. The bytes
//! themselves are never copied.

use core::fmt::{self, Write as _};

use crate::memory::ReadOnlyMemory;

/// Default number of handles a table can index.
pub const DEFAULT_TABLE_CAPACITY: usize = 32;

/// Errors raised while parsing or indexing a packed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// The buffer starts with the terminating empty segment.
    Empty,
    /// The buffer ended before the double terminator, at `offset`.
    Unterminated { offset: usize },
    /// The table holds more segments than the index can store.
    CapacityExceeded { count: usize, capacity: usize },
    /// A segment offset or length does not fit the 16-bit handle, or a
    /// segment does not fit the destination buffer.
    TooLarge { offset: usize },
    /// `get(index)` past the end of the table.
    IndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Empty => write!(f, "string table has no entries"),
            TableError::Unterminated { offset } => {
                write!(
                    f,
                    "string table is not double-null terminated (ran out at byte {offset})"
                )
            }
            TableError::CapacityExceeded { count, capacity } => {
                write!(
                    f,
                    "string table has {count} entries but capacity is {capacity}"
                )
            }
            TableError::TooLarge { offset } => {
                write!(f, "string table entry at byte {offset} is too large")
            }
            TableError::IndexOutOfRange { index, len } => {
                write!(f, "string index {index} out of range for table of {len}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TableError {}

/// Location of one segment inside a packed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringHandle {
    offset: u16,
    len: u16,
}

impl StringHandle {
    fn new(offset: usize, len: usize) -> Result<Self, TableError> {
        let too_large = TableError::TooLarge { offset };
        Ok(Self {
            offset: u16::try_from(offset).map_err(|_| too_large)?,
            len: u16::try_from(len).map_err(|_| too_large)?,
        })
    }

    /// Byte offset of the segment's first byte.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset as usize
    }

    /// Segment length, excluding the terminator.
    #[must_use]
    pub const fn len(self) -> usize {
        self.len as usize
    }

    /// Always false for handles produced by a parsed table.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Length of the null-terminated segment starting at `start`.
fn segment_len<M: ReadOnlyMemory + ?Sized>(memory: &M, start: usize) -> Result<usize, TableError> {
    let mut offset = start;
    loop {
        match memory.read_byte(offset) {
            Some(0) => return Ok(offset - start),
            Some(_) => offset += 1,
            None => return Err(TableError::Unterminated { offset }),
        }
    }
}

/// Counts the segments of a packed buffer without building an index.
///
/// # Errors
/// [`TableError::Empty`] when the buffer begins with the terminator,
/// [`TableError::Unterminated`] when the double terminator is missing.
pub fn count_segments<M: ReadOnlyMemory + ?Sized>(memory: &M) -> Result<usize, TableError> {
    let mut count = 0;
    let mut offset = 0;
    loop {
        let len = segment_len(memory, offset)?;
        if len == 0 {
            break;
        }
        count += 1;
        offset += len + 1;
    }
    if count == 0 {
        return Err(TableError::Empty);
    }
    Ok(count)
}

/// An indexed view over a packed string buffer.
///
/// `M` is the memory the buffer lives in, `N` the maximum number of entries.
/// Most code uses the [`StringTable`] alias for plain byte slices.
pub struct PackedStringTable<'a, M: ?Sized = [u8], const N: usize = DEFAULT_TABLE_CAPACITY> {
    memory: &'a M,
    index: heapless::Vec<StringHandle, N>,
}

/// A packed table over an ordinary byte slice.
pub type StringTable<'a, const N: usize = DEFAULT_TABLE_CAPACITY> = PackedStringTable<'a, [u8], N>;

impl<'a, M: ReadOnlyMemory + ?Sized, const N: usize> PackedStringTable<'a, M, N> {
    /// Parses `memory` into a table.
    ///
    /// # Errors
    /// Any [`TableError`] except `IndexOutOfRange`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flash_fsm_core::StringTable;
    ///
    /// let table: StringTable<'_> = StringTable::parse(b"1\0second\0third\0\0").unwrap();
    /// assert_eq!(table.len(), 3);
    /// assert_eq!(table.get(1).unwrap(), "second");
    /// ```
    pub fn parse(memory: &'a M) -> Result<Self, TableError> {
        let count = count_segments(memory)?;
        if count > N {
            return Err(TableError::CapacityExceeded { count, capacity: N });
        }

        let mut index = heapless::Vec::new();
        let mut offset = 0;
        while index.len() < count {
            let len = segment_len(memory, offset)?;
            index
                .push(StringHandle::new(offset, len)?)
                .map_err(|_| TableError::CapacityExceeded { count, capacity: N })?;
            offset += len + 1;
        }

        Ok(Self { memory, index })
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Parsed tables are never empty; kept for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// # Errors
    /// [`TableError::IndexOutOfRange`] when `index >= len()`.
    pub fn handle(&self, index: usize) -> Result<StringHandle, TableError> {
        self.index
            .get(index)
            .copied()
            .ok_or(TableError::IndexOutOfRange {
                index,
                len: self.index.len(),
            })
    }

    /// Returns entry `index`.
    ///
    /// # Errors
    /// [`TableError::IndexOutOfRange`] when `index >= len()`; adjacent memory is
    /// never read.
    pub fn get(&self, index: usize) -> Result<FlashStr<'a, M>, TableError> {
        let handle = self.handle(index)?;
        Ok(FlashStr {
            memory: self.memory,
            handle,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = FlashStr<'a, M>> + '_ {
        let memory = self.memory;
        self.index
            .iter()
            .map(move |&handle| FlashStr { memory, handle })
    }

    #[must_use]
    pub fn memory(&self) -> &'a M {
        self.memory
    }

    /// Writes every entry, comma-separated, in index order.
    ///
    /// # Errors
    /// Propagates errors from `sink`.
    pub fn render<W: fmt::Write + ?Sized>(&self, sink: &mut W) -> fmt::Result {
        for (i, entry) in self.iter().enumerate() {
            if i > 0 {
                sink.write_str(", ")?;
            }
            entry.write_to(sink)?;
        }
        Ok(())
    }
}

impl<M: ReadOnlyMemory + ?Sized, const N: usize> fmt::Display for PackedStringTable<'_, M, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f)
    }
}

impl<M: ReadOnlyMemory + ?Sized, const N: usize> fmt::Debug for PackedStringTable<'_, M, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// One segment of a packed table, read lazily through its memory accessor.
pub struct FlashStr<'a, M: ?Sized = [u8]> {
    memory: &'a M,
    handle: StringHandle,
}

impl<M: ?Sized> Clone for FlashStr<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: ?Sized> Copy for FlashStr<'_, M> {}

impl<'a, M: ReadOnlyMemory + ?Sized> FlashStr<'a, M> {
    #[must_use]
    pub fn handle(&self) -> StringHandle {
        self.handle
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handle.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handle.is_empty()
    }

    /// The segment's bytes, excluding the terminator.
    pub fn bytes(&self) -> impl Iterator<Item = u8> + 'a {
        let memory = self.memory;
        let start = self.handle.offset();
        (start..start + self.handle.len())
            .filter_map(move |offset| memory.read_byte(offset))
    }

    #[must_use]
    pub fn eq_bytes(&self, other: &[u8]) -> bool {
        self.len() == other.len() && self.bytes().eq(other.iter().copied())
    }

    /// Copies the segment into a fixed-capacity RAM string.
    ///
    /// # Errors
    /// [`TableError::TooLarge`] when the segment does not fit in `C` bytes.
    pub fn to_heapless<const C: usize>(&self) -> Result<heapless::String<C>, TableError> {
        let mut out = heapless::String::new();
        let too_large = TableError::TooLarge {
            offset: self.handle.offset(),
        };
        self.write_to(&mut out).map_err(|_| too_large)?;
        Ok(out)
    }

    fn write_to<W: fmt::Write + ?Sized>(&self, sink: &mut W) -> fmt::Result {
        for byte in self.bytes() {
            let ch = if byte.is_ascii() {
                char::from(byte)
            } else {
                char::REPLACEMENT_CHARACTER
            };
            sink.write_char(ch)?;
        }
        Ok(())
    }
}

impl<M: ReadOnlyMemory + ?Sized> fmt::Display for FlashStr<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

impl<M: ReadOnlyMemory + ?Sized> fmt::Debug for FlashStr<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        self.write_to(f)?;
        f.write_char('"')
    }
}

impl<M: ReadOnlyMemory + ?Sized> PartialEq<str> for FlashStr<'_, M> {
    fn eq(&self, other: &str) -> bool {
        self.eq_bytes(other.as_bytes())
    }
}

impl<M: ReadOnlyMemory + ?Sized> PartialEq<&str> for FlashStr<'_, M> {
    fn eq(&self, other: &&str) -> bool {
        self.eq_bytes(other.as_bytes())
    }
}

/// Segment count of a packed buffer, usable in constant context.
///
/// Returns 0 for buffers that are empty or missing the double terminator.
#[doc(hidden)]
#[must_use]
pub const fn const_segment_count(bytes: &[u8]) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == 0 {
            return count;
        }
        while i < bytes.len() && bytes[i] != 0 {
            i += 1;
        }
        if i == bytes.len() {
            return 0;
        }
        count += 1;
        i += 1;
    }
    0
}

/// Builds a packed, doubly-null-terminated `&'static [u8]` from string literals.
///
/// Labels must be non-empty and must not contain NUL; both mistakes would
/// silently shorten the table, so they are rejected at compile time.
///
/// ```rust
/// use flash_fsm_core::packed_strings;
///
/// const NAMES: &[u8] = packed_strings!("1", "second", "third");
/// assert_eq!(NAMES, b"1\0second\0third\0\0");
/// ```
#[macro_export]
macro_rules! packed_strings {
    ($($label:literal),+ $(,)?) => {{
        const PACKED: &[u8] = ::core::concat!($($label, "\0",)+ "\0").as_bytes();
        const _: () = ::core::assert!(
            $crate::strings::const_segment_count(PACKED) == [$($label),+].len(),
            "packed_strings! labels must be non-empty and must not contain NUL",
        );
        PACKED
    }};
}

/// Parses a packed buffer once into a `'static` table held in a `StaticCell`.
///
/// Evaluates to `Result<&'static StringTable<'static, CAP>, TableError>`. The
/// first successful evaluation of an expansion initializes the table; later
/// evaluations return the same reference without parsing again. A failed parse
/// stores nothing.
///
/// The once-guard runs inside a `critical_section`, so firmware must link a
/// critical-section implementation (e.g. cortex-m's `critical-section-single-core`).
/// The `std` feature provides one for hosts.
///
/// ```rust,no_run
/// use flash_fsm_core::{packed_strings, static_string_table};
///
/// fn names() -> &'static flash_fsm_core::StringTable<'static> {
///     static_string_table!(NAMES, packed_strings!("idle", "busy")).unwrap()
/// }
/// assert!(core::ptr::eq(names(), names()));
/// assert_eq!(names().len(), 2);
/// ```
#[macro_export]
macro_rules! static_string_table {
    ($name:ident, $bytes:expr) => {
        $crate::static_string_table!($name, $bytes, $crate::strings::DEFAULT_TABLE_CAPACITY)
    };
    ($name:ident, $bytes:expr, $cap:expr) => {{
        type __Table = $crate::StringTable<'static, { $cap }>;
        static $name: $crate::__private::StaticCell<__Table> = $crate::__private::StaticCell::new();
        static __SLOT: $crate::__private::critical_section::Mutex<
            ::core::cell::Cell<::core::option::Option<&'static __Table>>,
        > = $crate::__private::critical_section::Mutex::new(::core::cell::Cell::new(None));

        $crate::__private::critical_section::with(|cs| {
            let slot = __SLOT.borrow(cs);
            if let ::core::option::Option::Some(table) = slot.get() {
                return ::core::result::Result::Ok(table);
            }
            __Table::parse($bytes).map(|table| {
                let table: &'static __Table = $name.init(table);
                slot.set(::core::option::Option::Some(table));
                table
            })
        })
    }};
}
