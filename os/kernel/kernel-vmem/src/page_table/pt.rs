//! # Page Table (PT)
//!
//! The leaf level of 32-bit paging.
//!
//! - [`PtIndex`]: index type for VA bits `[21:12]`.
//! - [`PtEntry`]: a PT entry (PTE) mapping one 4 KiB frame.
//! - [`PageTable`]: a 4 KiB-aligned array of 1024 PTEs.
//!
//! After modifying an active mapping the caller must perform the required TLB
//! maintenance.

use crate::PageEntryBits;
use crate::addresses::{PhysicalPage, Size4K, VirtualAddress};
use crate::page_table::{ENTRY_COUNT, EntryState};
use kernel_info::memory::TABLE_ENTRIES;

/// Index into the Page Table (derived from VA bits `[21:12]`).
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PtIndex(u16);

/// A single Page Table entry (PTE).
#[doc(alias = "PTE")]
#[repr(transparent)]
#[derive(Copy, Clone, Debug)]
pub struct PtEntry(PageEntryBits);

/// The Page Table: 1024 entries, 4 KiB-aligned.
#[doc(alias = "PT")]
#[repr(C, align(4096))]
pub struct PageTable {
    entries: [PtEntry; TABLE_ENTRIES],
}

const _: () = assert!(size_of::<PageTable>() == 4096);

impl PtIndex {
    /// Build an index from a virtual address (extracts bits `[21:12]`).
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from(va: VirtualAddress) -> Self {
        Self::new(((va.as_u32() >> 12) & 0x3FF) as u16)
    }

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

impl PtEntry {
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

    /// Create a fresh 4 KiB leaf: `frame base | present`.
    ///
    /// All flag bits other than present start cleared, including the
    /// accessed and dirty bits.
    #[inline]
    #[must_use]
    pub const fn make_4k(page: PhysicalPage<Size4K>) -> Self {
        Self(
            PageEntryBits::new()
                .with_present(true)
                .with_frame_base(page.base()),
        )
    }

    /// The same entry with the present bit cleared; every other bit is kept.
    #[inline]
    #[must_use]
    pub const fn without_present(self) -> Self {
        Self(self.0.with_present(false))
    }

    /// The frame stored in bits 31..12, whether or not the entry is present.
    #[inline]
    #[must_use]
    pub const fn frame(self) -> PhysicalPage<Size4K> {
        PhysicalPage::from_addr(self.0.frame_base())
    }

    #[inline]
    #[must_use]
    pub const fn accessed(self) -> bool {
        self.0.accessed()
    }

    #[inline]
    #[must_use]
    pub const fn dirty(self) -> bool {
        self.0.dirty()
    }

    #[inline]
    #[must_use]
    pub const fn state(self) -> EntryState {
        if self.is_present() {
            EntryState::Mapped
        } else if self.is_unused() {
            EntryState::Never
        } else {
            EntryState::Stale
        }
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0.into_bits()
    }

    /// Construct from a raw 32-bit value. No validation is performed.
    #[inline]
    #[must_use]
    pub const fn from_raw(v: u32) -> Self {
        Self(PageEntryBits::from_bits(v))
    }
}

impl PageTable {
    /// Read the entry at `i`.
    ///
    /// Plain load; does not imply any TLB synchronization.
    #[inline]
    #[must_use]
    pub const fn get(&self, i: PtIndex) -> PtEntry {
        self.entries[i.as_usize()]
    }

    /// Write the entry at `i`.
    ///
    /// Caller must handle any required TLB invalidation when changing active mappings.
    #[inline]
    pub const fn set(&mut self, i: PtIndex, e: PtEntry) {
        self.entries[i.as_usize()] = e;
    }

    /// All entries with their indices, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (PtIndex, PtEntry)> + '_ {
        (0..ENTRY_COUNT).map(PtIndex::new).map(|i| (i, self.get(i)))
    }
}
