//! TLB maintenance and the emergency stop.

use kernel_memory_addresses::VirtualAddress;

/// Drop the cached translation for the page containing `va` on this CPU.
///
/// # Safety
/// Must run at CPL0.
#[inline]
pub unsafe fn invalidate_page(va: VirtualAddress) {
    let va = va.as_u32() as usize;
    unsafe {
        core::arch::asm!("invlpg [{}]", in(reg) va, options(nostack, preserves_flags));
    }
}

/// Disable interrupts and halt forever.
#[inline]
pub fn halt() -> ! {
    loop {
        // SAFETY: `cli; hlt` only stops this CPU.
        unsafe {
            core::arch::asm!("cli", "hlt", options(nomem, nostack));
        }
    }
}
