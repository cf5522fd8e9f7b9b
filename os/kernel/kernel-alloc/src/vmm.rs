//! Minimal Virtual Memory Manager (VMM) for the kernel.
//!
//! One page directory, created on first use, plus the page tables hanging off
//! it. Frames come from a [`FrameAlloc`] and are zero-filled through the
//! [`PhysMapper`] before use; TLB maintenance and diagnostics go through the
//! [`Platform`].
//!
//! A few behaviors are kept loose on purpose and callers should know them:
//!
//! - [`Vmm::map`] never invalidates the TLB. Overwriting a live mapping needs
//!   an [`Vmm::unmap`] (or an explicit invalidation) first.
//! - [`Vmm::resolve`] ignores the leaf's present bit.
//! - [`Vmm::is_dirty`] and [`Vmm::is_accessed`] create the page table for
//!   `va` if it does not exist yet.
//!
//! # Example
//! ```ignore
//! use kernel_alloc::{frame_alloc::BumpFrameAlloc, phys_mapper::IdentityPhysMapper};
//! use kernel_alloc::{platform::X86Platform, vmm::Vmm};
//!
//! let mapper = IdentityPhysMapper;
//! let mut vmm = Vmm::new(&mapper, BumpFrameAlloc::new(), X86Platform::new());
//! vmm.map(va, pa)?;
//! ```

use crate::platform::Platform;
use kernel_vmem::addresses::{PhysicalAddress, PhysicalPage, Size4K, VirtualAddress};
use kernel_vmem::{
    AddressSpace, AddressSpaceError, EntryState, FrameAlloc, PhysMapper, PtEntry, RootPage,
    alloc_zeroed_frame,
};

/// Minimal kernel virtual memory manager.
pub struct Vmm<'m, M: PhysMapper, A: FrameAlloc, P: Platform> {
    mapper: &'m M,
    alloc: A,
    platform: P,
    /// Page directory; `None` until first requested.
    root: Option<RootPage>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum VmmError {
    #[error("out of physical frames")]
    OutOfFrames,
    #[error("virtual memory manager re-entered while busy")]
    Busy,
}

impl From<AddressSpaceError> for VmmError {
    fn from(value: AddressSpaceError) -> Self {
        match value {
            AddressSpaceError::OutOfFrames => Self::OutOfFrames,
        }
    }
}

impl<'m, M: PhysMapper, A: FrameAlloc, P: Platform> Vmm<'m, M, A, P> {
    /// A VMM with no page directory yet.
    #[must_use]
    pub const fn new(mapper: &'m M, alloc: A, platform: P) -> Self {
        Self {
            mapper,
            alloc,
            platform,
            root: None,
        }
    }

    #[inline]
    const fn address_space(&self, root: RootPage) -> AddressSpace<'m, M> {
        AddressSpace::from_root(self.mapper, root)
    }

    /// Allocate one zero-filled 4 KiB frame.
    ///
    /// # Errors
    /// [`VmmError::OutOfFrames`] when the allocator is exhausted.
    pub fn allocate_frame(&mut self) -> Result<PhysicalPage<Size4K>, VmmError> {
        alloc_zeroed_frame(self.mapper, &mut self.alloc).ok_or(VmmError::OutOfFrames)
    }

    /// The page directory, allocated on the first call.
    ///
    /// # Errors
    /// [`VmmError::OutOfFrames`] if the directory has to be created and no
    /// frame is left.
    pub fn page_directory(&mut self) -> Result<RootPage, VmmError> {
        if let Some(root) = self.root {
            return Ok(root);
        }
        let root = self.allocate_frame()?;
        log::debug!("page directory at {root}");
        self.root = Some(root);
        Ok(root)
    }

    /// The page table covering `va`, created (along with the directory) if
    /// needed.
    ///
    /// # Errors
    /// [`VmmError::OutOfFrames`] if a frame was needed and none is left.
    pub fn page_table_for(&mut self, va: VirtualAddress) -> Result<PhysicalPage<Size4K>, VmmError> {
        self.walk(va).map(|(_, table)| table)
    }

    fn walk(
        &mut self,
        va: VirtualAddress,
    ) -> Result<(AddressSpace<'m, M>, PhysicalPage<Size4K>), VmmError> {
        let root = self.page_directory()?;
        let aspace = self.address_space(root);
        let table = aspace.table_for(&mut self.alloc, va)?;
        Ok((aspace, table))
    }

    /// Map the page containing `va` to the frame containing `pa`.
    ///
    /// The leaf is written as `frame | present`; flags from `pa` and any prior
    /// accessed/dirty state are dropped. No TLB invalidation is issued.
    ///
    /// # Errors
    /// [`VmmError::OutOfFrames`] if a page table could not be created.
    pub fn map(&mut self, va: VirtualAddress, pa: PhysicalAddress) -> Result<(), VmmError> {
        let (aspace, table) = self.walk(va)?;
        let frame = pa.page::<Size4K>();
        aspace.set_leaf(table, va, PtEntry::make_4k(frame));
        log::debug!("mapped {va} -> {frame}");
        Ok(())
    }

    /// Clear the present bit of the leaf for `va` and invalidate its TLB entry.
    ///
    /// A no-op (no invalidation either) when the directory entry for `va` is
    /// not present. The rest of the leaf is left in place.
    pub fn unmap(&mut self, va: VirtualAddress) {
        let Some(root) = self.root else {
            return;
        };
        let aspace = self.address_space(root);
        let Some(table) = aspace.present_table(va) else {
            return;
        };
        aspace.set_leaf(table, va, aspace.leaf(table, va).without_present());
        self.platform.invalidate_tlb_entry(va);
        log::debug!("unmapped {va}");
    }

    /// Translate `va`.
    ///
    /// `None` only if the directory slot for `va` was never written. Otherwise
    /// the leaf's frame base plus the in-page offset, whether or not the leaf
    /// is present.
    #[must_use]
    pub fn resolve(&self, va: VirtualAddress) -> Option<PhysicalAddress> {
        self.address_space(self.root?).translate(va)
    }

    /// Whether the CPU has written through the mapping of `va`.
    ///
    /// # Errors
    /// [`VmmError::OutOfFrames`] if the page table had to be created and no
    /// frame is left.
    pub fn is_dirty(&mut self, va: VirtualAddress) -> Result<bool, VmmError> {
        Ok(self.leaf(va)?.dirty())
    }

    /// Whether the CPU has accessed the mapping of `va`.
    ///
    /// # Errors
    /// See [`is_dirty`](Self::is_dirty).
    pub fn is_accessed(&mut self, va: VirtualAddress) -> Result<bool, VmmError> {
        Ok(self.leaf(va)?.accessed())
    }

    fn leaf(&mut self, va: VirtualAddress) -> Result<PtEntry, VmmError> {
        let (aspace, table) = self.walk(va)?;
        Ok(aspace.leaf(table, va))
    }

    /// Lifecycle state of the leaf for `va`. Never allocates.
    #[must_use]
    pub fn entry_state(&self, va: VirtualAddress) -> EntryState {
        let Some(root) = self.root else {
            return EntryState::Never;
        };
        let aspace = self.address_space(root);
        aspace
            .existing_table(va)
            .map_or(EntryState::Never, |table| aspace.leaf(table, va).state())
    }

    /// Service a page fault at `va` with a fresh zero-filled frame.
    ///
    /// Any failure is fatal: the platform is shut down.
    pub fn page_fault(&mut self, va: VirtualAddress) {
        self.platform.emit_labeled_hex("page fault @ ", va.as_u32());
        if let Err(e) = self.demand_page(va) {
            self.fatal(e);
        }
    }

    fn demand_page(&mut self, va: VirtualAddress) -> Result<(), VmmError> {
        let frame = self.allocate_frame()?;
        let page = va.page::<Size4K>().base();
        self.map(page, frame.base())?;
        log::debug!("demand-paged {page} with {frame}");
        Ok(())
    }

    /// Write the directory and every written table entry to the console.
    ///
    /// Entries are listed when their raw value is non-zero, so stale leaves
    /// (present bit cleared by [`unmap`](Self::unmap)) show up too.
    ///
    /// ```text
    /// PD @ 0x100000
    ///     0x1) PDE = 0x101001
    ///         0x0) PTE = 0x200001
    /// ```
    ///
    /// # Errors
    /// [`VmmError::OutOfFrames`] if the directory had to be created and no
    /// frame is left.
    pub fn dump(&mut self) -> Result<(), VmmError> {
        let root = self.page_directory()?;
        let aspace = self.address_space(root);

        self.platform.emit_labeled_hex("PD @ ", root.base().as_u32());
        for (i, pde) in aspace.directory().iter() {
            if pde.is_unused() {
                continue;
            }
            self.platform.emit_string("    ");
            self.platform.emit_hex(i.as_u32());
            self.platform.emit_labeled_hex(") PDE = ", pde.raw());

            for (j, pte) in aspace.table(pde.table()).iter() {
                if pte.is_unused() {
                    continue;
                }
                self.platform.emit_string("        ");
                self.platform.emit_hex(j.as_u32());
                self.platform.emit_labeled_hex(") PTE = ", pte.raw());
            }
        }
        Ok(())
    }

    /// Load CR3 with the page directory and enable paging.
    ///
    /// # Errors
    /// [`VmmError::OutOfFrames`] if the directory had to be created and no
    /// frame is left.
    ///
    /// # Safety
    /// The running kernel's code, data and stack must be mapped in this
    /// address space.
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    pub unsafe fn activate(&mut self) -> Result<(), VmmError> {
        let root = self.page_directory()?;
        unsafe { self.address_space(root).activate() };
        Ok(())
    }

    /// Report `err` and stop the machine.
    pub fn fatal(&mut self, err: VmmError) -> ! {
        log::error!("vmm: fatal: {err}");
        self.platform.emit_fmt(format_args!("vmm: fatal: {err}\n"));
        self.platform.shutdown()
    }

    /// The frame allocator.
    #[must_use]
    pub const fn frame_alloc(&self) -> &A {
        &self.alloc
    }

    #[must_use]
    pub const fn platform(&self) -> &P {
        &self.platform
    }

    /// The page directory if it was already created.
    #[must_use]
    pub const fn root(&self) -> Option<RootPage> {
        self.root
    }

    /// Borrow the raw bytes of `frame`.
    #[must_use]
    pub fn frame_bytes(&self, frame: PhysicalPage<Size4K>) -> &[u8; 4096] {
        use kernel_vmem::PhysMapperExt;
        self.mapper.frame_bytes_mut(frame)
    }
}
