//! # Address Space (32-bit, page-directory-rooted)
//!
//! Strongly-typed helpers to walk and manipulate a **single** virtual address
//! space: one [`PageDirectory`] plus the [`PageTable`]s it links.
//!
//! ## Highlights
//!
//! - [`AddressSpace::table_for`] finds the page table covering a VA, creating
//!   and linking a zeroed one when the directory slot was never written.
//! - [`AddressSpace::existing_table`] / [`AddressSpace::present_table`] look a
//!   table up without allocating.
//! - [`AddressSpace::translate`] resolves a VA the way the kernel's lookup
//!   routine does (see its docs for the exact, deliberately loose rules).
//! - [`AddressSpace::activate`] loads CR3 and turns paging on.
//!
//! ## Safety
//!
//! - Mutating active mappings requires appropriate **TLB maintenance**; this
//!   module never issues `invlpg` itself.
//! - The provided [`PhysMapper`] must yield **writable** references to table frames.

use crate::addresses::{PhysicalAddress, PhysicalPage, Size4K, VirtualAddress};
use crate::page_table::pd::{PageDirectory, PdEntry};
use crate::page_table::pt::{PageTable, PtEntry};
use crate::page_table::split_indices;
use crate::{FrameAlloc, PhysMapper, PhysMapperExt, alloc_zeroed_frame};

/// Handle to a single, concrete address space.
pub struct AddressSpace<'m, M: PhysMapper> {
    root: PhysicalPage<Size4K>, // PD frame
    mapper: &'m M,
}

/// The page directory root page for an [`AddressSpace`].
pub type RootPage = PhysicalPage<Size4K>;

/// Failures of the table walker.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum AddressSpaceError {
    #[error("out of physical frames for a page table")]
    OutOfFrames,
}

impl<'m, M: PhysMapper> AddressSpace<'m, M> {
    /// Wrap an existing page directory frame.
    #[inline]
    pub const fn from_root(mapper: &'m M, root: RootPage) -> Self {
        Self { root, mapper }
    }

    /// Borrow the [`PageDirectory`] as a typed table.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub fn directory(&self) -> &mut PageDirectory {
        self.mapper.directory_mut(self.root)
    }

    /// Borrow the [`PageTable`] in `page`.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub fn table(&self, page: PhysicalPage<Size4K>) -> &mut PageTable {
        self.mapper.table_mut(page)
    }

    /// Return the page table covering `va`, creating it if needed.
    ///
    /// A directory slot that is exactly zero gets a freshly zeroed table linked
    /// as `table | present`. Any other slot is trusted as-is, even one whose
    /// present bit is clear, and its stored frame base is returned.
    ///
    /// # Errors
    /// [`AddressSpaceError::OutOfFrames`] if a table was needed and `alloc`
    /// is exhausted. The directory is left untouched in that case.
    pub fn table_for<A: FrameAlloc>(
        &self,
        alloc: &mut A,
        va: VirtualAddress,
    ) -> Result<PhysicalPage<Size4K>, AddressSpaceError> {
        let (pdi, _) = split_indices(va);
        let pd = self.directory();
        let pde = pd.get(pdi);
        if !pde.is_unused() {
            return Ok(pde.table());
        }

        let table = alloc_zeroed_frame(self.mapper, alloc).ok_or(AddressSpaceError::OutOfFrames)?;
        pd.set(pdi, PdEntry::make_table(table));
        log::debug!("linked page table {table} at directory index {pdi:?}");
        Ok(table)
    }

    /// The table frame recorded for `va`, if its directory slot was ever written.
    #[must_use]
    pub fn existing_table(&self, va: VirtualAddress) -> Option<PhysicalPage<Size4K>> {
        let (pdi, _) = split_indices(va);
        let pde = self.directory().get(pdi);
        if pde.is_unused() { None } else { Some(pde.table()) }
    }

    /// The table frame for `va`, only if its directory entry is present.
    #[must_use]
    pub fn present_table(&self, va: VirtualAddress) -> Option<PhysicalPage<Size4K>> {
        let (pdi, _) = split_indices(va);
        self.directory().get(pdi).next_table()
    }

    /// Read the leaf for `va` from `table`.
    #[inline]
    #[must_use]
    pub fn leaf(&self, table: PhysicalPage<Size4K>, va: VirtualAddress) -> PtEntry {
        let (_, pti) = split_indices(va);
        self.table(table).get(pti)
    }

    /// Overwrite the leaf for `va` in `table`.
    #[inline]
    pub fn set_leaf(&self, table: PhysicalPage<Size4K>, va: VirtualAddress, entry: PtEntry) {
        let (_, pti) = split_indices(va);
        self.table(table).set(pti, entry);
    }

    /// Translate `va` to a physical address.
    ///
    /// Returns `None` only when the directory slot is zero. Otherwise the
    /// leaf's frame base is combined with the in-page offset **without**
    /// checking the leaf's present bit, so an unmapped page inside a known
    /// table yields its stale (or zero) frame.
    #[must_use]
    pub fn translate(&self, va: VirtualAddress) -> Option<PhysicalAddress> {
        let table = self.existing_table(va)?;
        Some(self.leaf(table, va).frame().join(va.offset()))
    }

    /// Load CR3 with this address space's root and set CR0.PG.
    ///
    /// # Safety
    /// The currently executing code and data must be mapped in this space,
    /// and the caller must run at CPL0.
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    pub unsafe fn activate(&self) {
        use kernel_registers::cr0::Cr0;
        use kernel_registers::cr3::Cr3;
        use kernel_registers::{LoadRegisterUnsafe, StoreRegisterUnsafe};

        log::info!("activating page directory {}", self.root);
        unsafe {
            Cr3::from_page_directory(self.root.base(), false, false).store_unsafe();
            Cr0::load_unsafe().with_pg_paging(true).store_unsafe();
        }
    }
}
