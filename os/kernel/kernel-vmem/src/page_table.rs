//! # Page Directory and Page Table

pub mod pd;
pub mod pt;

use crate::addresses::VirtualAddress;
use crate::page_table::pd::PdIndex;
use crate::page_table::pt::PtIndex;
use kernel_info::memory::TABLE_ENTRIES;

/// Number of entries per table, as an index-sized constant.
pub(crate) const ENTRY_COUNT: u16 = 1024;

const _: () = assert!(ENTRY_COUNT as usize == TABLE_ENTRIES);

/// Split a virtual address into its directory and table indices.
///
/// ```text
/// | 31‒22 | 21‒12 | 11‒0   |
/// |   PD  |   PT  | Offset |
/// ```
#[inline]
#[must_use]
pub const fn split_indices(va: VirtualAddress) -> (PdIndex, PtIndex) {
    (PdIndex::from(va), PtIndex::from(va))
}

/// Lifecycle of a single leaf entry as software observes it.
///
/// `Never` and `Stale` are equivalent to the CPU (both fault on access) but
/// distinguishable in a dump: a stale entry still carries the frame base of
/// its last mapping.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EntryState {
    /// The entry is all zeros; nothing was ever installed.
    Never,
    /// The present bit is set.
    Mapped,
    /// The present bit is clear but other bits survive from a prior mapping.
    Stale,
}
