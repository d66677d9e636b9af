//! Human-readable names for states and triggers.
//!
//! A graph never needs names to run. When a pair of [`LabelTable`]s is attached
//! the context can render its current state and the diagram export can name
//! every node; without one, states print as `S<n>` and triggers as `T<n>`.

use core::fmt;
use core::marker::PhantomData;

use crate::memory::ReadOnlyMemory;
use crate::strings::{PackedStringTable, StringTable, TableError};

/// Which id space a label table names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    State,
    Trigger,
}

impl LabelKind {
    const fn prefix(self) -> char {
        match self {
            LabelKind::State => 'S',
            LabelKind::Trigger => 'T',
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelKind::State => f.write_str("state"),
            LabelKind::Trigger => f.write_str("trigger"),
        }
    }
}

/// Object-safe view of an indexed list of names.
pub trait LabelTable {
    fn label_count(&self) -> usize;

    /// Writes the name at `index`. Callers only pass `index < label_count()`.
    fn write_label(&self, index: usize, sink: &mut dyn fmt::Write) -> fmt::Result;
}

impl<M: ReadOnlyMemory + ?Sized, const N: usize> LabelTable for PackedStringTable<'_, M, N> {
    fn label_count(&self) -> usize {
        self.len()
    }

    fn write_label(&self, index: usize, sink: &mut dyn fmt::Write) -> fmt::Result {
        match self.get(index) {
            Ok(entry) => write!(sink, "{entry}"),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Implemented by `#[derive(States)]` and `#[derive(Triggers)]`.
///
/// `PACKED` holds every variant label in declaration order, in the same
/// doubly-null-terminated layout [`StringTable::parse`] reads.
pub trait Labels: Copy + Eq + 'static {
    const KIND: LabelKind;
    const PACKED: &'static [u8];
    const COUNT: usize;

    /// Declaration-order position of this variant.
    fn index(self) -> u8;

    fn from_index(index: u8) -> Option<Self>;

    fn name(self) -> &'static str;

    /// Parses [`Labels::PACKED`] into a string table.
    ///
    /// # Errors
    /// [`TableError::CapacityExceeded`] when `N < COUNT`.
    fn table<const N: usize>() -> Result<StringTable<'static, N>, TableError> {
        StringTable::parse(Self::PACKED)
    }

    /// A `'static` label table backed by the enum itself.
    fn label_table() -> &'static (dyn LabelTable + Sync) {
        LabelSet::<Self>::INSTANCE
    }
}

/// Adapts a [`Labels`] enum into a [`LabelTable`] without parsing anything.
pub struct LabelSet<L>(PhantomData<fn() -> L>);

impl<L: Labels> LabelSet<L> {
    pub const INSTANCE: &'static Self = &LabelSet(PhantomData);
}

impl<L: Labels> LabelTable for LabelSet<L> {
    fn label_count(&self) -> usize {
        L::COUNT
    }

    fn write_label(&self, index: usize, sink: &mut dyn fmt::Write) -> fmt::Result {
        let label = u8::try_from(index)
            .ok()
            .and_then(L::from_index)
            .ok_or(fmt::Error)?;
        sink.write_str(label.name())
    }
}

/// Displays one id through an optional label table, falling back to
/// `S<n>`/`T<n>`.
#[derive(Clone, Copy)]
pub struct Label<'t> {
    table: Option<&'t (dyn LabelTable + Sync)>,
    kind: LabelKind,
    index: usize,
}

impl<'t> Label<'t> {
    #[must_use]
    pub fn new(table: Option<&'t (dyn LabelTable + Sync)>, kind: LabelKind, index: usize) -> Self {
        Self { table, kind, index }
    }
}

impl fmt::Display for Label<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.table {
            Some(table) if self.index < table.label_count() => table.write_label(self.index, f),
            _ => write!(f, "{}{}", self.kind.prefix(), self.index),
        }
    }
}

impl fmt::Debug for Label<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
