//! # Identity PhysMapper for the Kernel
//!
//! A 32-bit kernel of this size runs with low physical memory identity
//! mapped: the frame pool, the page directory and every page table live at
//! virtual addresses equal to their physical ones. Converting a physical
//! address to a pointer is then a plain cast.
//!
//! ## Example
//! ```rust,no_run
//! use kernel_alloc::phys_mapper::IdentityPhysMapper;
//! use kernel_vmem::addresses::{PhysicalAddress, PhysicalPage};
//! use kernel_vmem::PhysMapperExt;
//!
//! let mapper = IdentityPhysMapper;
//! let frame = PhysicalPage::from_addr(PhysicalAddress::new(0x0010_0000));
//! mapper.zero_frame(frame);
//! ```

use kernel_vmem::PhysMapper;
use kernel_vmem::addresses::PhysicalAddress;

/// [`PhysMapper`] for identity-mapped physical memory.
///
/// # Safety
/// - The referenced physical range must be identity mapped (or paging must
///   still be off).
/// - The returned reference must only be used for valid, writable memory.
#[derive(Debug, Default, Copy, Clone)]
pub struct IdentityPhysMapper;

impl PhysMapper for IdentityPhysMapper {
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T {
        let va = pa.as_u32() as usize as *mut T;
        // SAFETY: Caller must ensure the physical address is valid and identity mapped.
        unsafe { &mut *va }
    }
}
