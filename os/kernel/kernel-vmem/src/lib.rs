//! # Virtual Memory Support
//!
//! Two-level paging helpers for a 32-bit protected-mode kernel.
//!
//! ## What you get
//! - An [`address space`](address_space) describing a page-directory-rooted tree.
//! - Typed [`PageDirectory`] / [`PageTable`] wrappers with their entry types.
//! - The raw [`PageEntryBits`] layout shared by both levels.
//! - A tiny allocator/mapper interface ([`FrameAlloc`], [`PhysMapper`]).
//!
//! ## 32-bit Virtual Address → Physical Address Walk
//!
//! Each 32-bit virtual address is divided into three fields:
//!
//! ```text
//! | 31‒22 | 21‒12 | 11‒0   |
//! |   PD  |   PT  | Offset |
//! ```
//!
//! The CPU uses the first two fields as **indices** into two levels of tables,
//! each containing 1024 (2¹⁰) entries of 4 bytes.
//!
//! ```text
//!  CR3 → PD  →  PT  →  Physical Page
//!        │       │
//!        │       └───► PTE (Page Table Entry)     → maps 4 KiB page
//!        └───────────► PDE (Page Directory Entry) → points to a PT
//! ```
//!
//! | Level | Table name | Entry name | Description |
//! |:------|:-----------|:-----------|:------------|
//! | 1 | **PD** (Page Directory) | **PDE** | One per address space, referenced by [`CR3`](https://wiki.osdev.org/CPU_Registers_x86#CR3). Each entry covers 4 MiB of virtual memory. |
//! | 2 | **PT** (Page Table) | **PTE** | Each entry maps a single 4 KiB frame. |
//!
//! Page tables are created on demand by the walker; directory entries are
//! never removed once written.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code, clippy::inline_always)]

pub mod address_space;
mod page_entry_bits;
mod page_table;

pub use crate::address_space::{AddressSpace, AddressSpaceError, RootPage};
pub use crate::page_entry_bits::PageEntryBits;
pub use crate::page_table::pd::{PageDirectory, PdEntry, PdIndex};
pub use crate::page_table::pt::{PageTable, PtEntry, PtIndex};
pub use crate::page_table::{EntryState, split_indices};
pub use kernel_memory_addresses as addresses;

/// Re-export constants as info module.
pub use kernel_info::memory as info;

use crate::addresses::{PhysicalAddress, PhysicalPage, Size4K};

/// Minimal frame allocator used to obtain **physical** 4 KiB frames
/// for page tables and mapped pages.
///
/// The implementation decides where frames come from. Returned frames
/// **must** be 4 KiB aligned and are never handed out twice.
///
/// Returns `None` on out-of-memory.
pub trait FrameAlloc {
    /// Allocate one 4 KiB *physical* frame.
    fn alloc_4k(&mut self) -> Option<PhysicalPage<Size4K>>;
}

/// Converts physical addresses to usable pointers in the current address
/// space.
///
/// Before paging is enabled, and for frames the kernel identity-maps, this is
/// a plain cast. Tests back it with ordinary heap memory.
pub trait PhysMapper {
    /// Convert a *physical* address to a usable mutable reference.
    ///
    /// # Safety
    /// - `pa` must be readable and writable through the current mapping for
    ///   the whole lifetime `'a`.
    /// - The bytes at `pa` must be a valid `T`, and no other live reference
    ///   may alias them.
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T;
}

/// Typed views of table frames on top of any [`PhysMapper`].
pub trait PhysMapperExt: PhysMapper {
    /// Borrow the frame at `page` as a [`PageDirectory`].
    #[inline]
    #[allow(clippy::mut_from_ref)]
    fn directory_mut(&self, page: PhysicalPage<Size4K>) -> &mut PageDirectory {
        // SAFETY: every frame is 4 KiB and every bit pattern is a valid directory.
        unsafe { self.phys_to_mut::<PageDirectory>(page.base()) }
    }

    /// Borrow the frame at `page` as a [`PageTable`].
    #[inline]
    #[allow(clippy::mut_from_ref)]
    fn table_mut(&self, page: PhysicalPage<Size4K>) -> &mut PageTable {
        // SAFETY: every frame is 4 KiB and every bit pattern is a valid table.
        unsafe { self.phys_to_mut::<PageTable>(page.base()) }
    }

    /// Borrow the frame at `page` as raw bytes.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    fn frame_bytes_mut(&self, page: PhysicalPage<Size4K>) -> &mut [u8; 4096] {
        // SAFETY: a frame is exactly 4096 bytes.
        unsafe { self.phys_to_mut::<[u8; 4096]>(page.base()) }
    }

    /// Fill the frame at `page` with zeros.
    #[inline]
    fn zero_frame(&self, page: PhysicalPage<Size4K>) {
        self.frame_bytes_mut(page).fill(0);
    }
}

impl<M: PhysMapper + ?Sized> PhysMapperExt for M {}

/// Allocate one frame and clear it so it can serve as an empty table.
///
/// Returns `None` if `alloc` is exhausted.
pub fn alloc_zeroed_frame<M: PhysMapper, A: FrameAlloc>(
    mapper: &M,
    alloc: &mut A,
) -> Option<PhysicalPage<Size4K>> {
    let page = alloc.alloc_4k()?;
    mapper.zero_frame(page);
    log::trace!("zeroed frame {page}");
    Some(page)
}
