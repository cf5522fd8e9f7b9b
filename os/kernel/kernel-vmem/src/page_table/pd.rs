//! # Page Directory (PD)
//!
//! The top level of 32-bit paging.
//!
//! - [`PdIndex`]: index type for VA bits `[31:22]`.
//! - [`PdEntry`]: a PD entry (PDE). Every present entry points to a
//!   [`PageTable`](crate::PageTable); 4 MiB leaves (PSE) are not used.
//! - [`PageDirectory`]: a 4 KiB-aligned array of 1024 PDEs.
//!
//! ## Invariants & Notes
//!
//! - A never-written slot is all zeros; [`PdEntry::is_unused`] tests for that
//!   exact value rather than for the present bit, so a slot whose present bit
//!   was cleared keeps pointing at its table.
//! - Accessed/dirty bits of directory entries are CPU-maintained and never
//!   read here.

use crate::PageEntryBits;
use crate::addresses::{PhysicalPage, Size4K, VirtualAddress};
use crate::page_table::ENTRY_COUNT;
use kernel_info::memory::TABLE_ENTRIES;

/// Index into the Page Directory (derived from VA bits `[31:22]`).
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PdIndex(u16);

/// A single Page Directory entry (PDE).
#[doc(alias = "PDE")]
#[repr(transparent)]
#[derive(Copy, Clone, Debug)]
pub struct PdEntry(PageEntryBits);

/// The Page Directory: 1024 entries, 4 KiB-aligned.
#[doc(alias = "PD")]
#[repr(C, align(4096))]
pub struct PageDirectory {
    entries: [PdEntry; TABLE_ENTRIES],
}

const _: () = assert!(size_of::<PageDirectory>() == 4096);

impl PdIndex {
    /// Build an index from a virtual address (extracts bits `[31:22]`).
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from(va: VirtualAddress) -> Self {
        Self::new((va.as_u32() >> 22) as u16)
    }

    /// Construct from a raw `u16`; asserts `v < 1024` in debug builds.
    #[inline]
    #[must_use]
    pub const fn new(v: u16) -> Self {
        debug_assert!(v < ENTRY_COUNT);
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0 as u32
    }
}

impl PdEntry {
    /// `true` if the slot was never written (all 32 bits zero).
    #[inline]
    #[must_use]
    pub const fn is_unused(self) -> bool {
        self.0.into_bits() == 0
    }

    #[inline]
    #[must_use]
    pub const fn is_present(self) -> bool {
        self.0.present()
    }

    /// Link a page table: `table base | present`, every other bit clear.
    #[inline]
    #[must_use]
    pub const fn make_table(table: PhysicalPage<Size4K>) -> Self {
        Self(
            PageEntryBits::new()
                .with_present(true)
                .with_frame_base(table.base()),
        )
    }

    /// The page table frame stored in bits 31..12, regardless of the present bit.
    #[inline]
    #[must_use]
    pub const fn table(self) -> PhysicalPage<Size4K> {
        PhysicalPage::from_addr(self.0.frame_base())
    }

    /// If present, the page table this entry points to.
    #[inline]
    #[must_use]
    pub const fn next_table(self) -> Option<PhysicalPage<Size4K>> {
        if self.is_present() {
            Some(self.table())
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0.into_bits()
    }

    #[inline]
    #[must_use]
    pub const fn from_raw(v: u32) -> Self {
        Self(PageEntryBits::from_bits(v))
    }
}

impl PageDirectory {
    /// Read the entry at `i`.
    #[inline]
    #[must_use]
    pub const fn get(&self, i: PdIndex) -> PdEntry {
        self.entries[i.as_usize()]
    }

    /// Write the entry at `i`.
    #[inline]
    pub const fn set(&mut self, i: PdIndex, e: PdEntry) {
        self.entries[i.as_usize()] = e;
    }

    /// All entries with their indices, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (PdIndex, PdEntry)> + '_ {
        (0..ENTRY_COUNT).map(PdIndex::new).map(|i| (i, self.get(i)))
    }
}
