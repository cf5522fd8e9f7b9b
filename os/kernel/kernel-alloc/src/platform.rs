//! CPU-facing collaborators of the VMM.

use crate::console::Console;
use kernel_vmem::addresses::VirtualAddress;

/// Privileged CPU operations the VMM relies on.
pub trait CpuControl {
    /// Drop any cached translation for the page containing `va` on this CPU.
    fn invalidate_tlb_entry(&mut self, va: VirtualAddress);

    /// Stop the machine. Used for unrecoverable VMM errors.
    fn shutdown(&mut self) -> !;
}

/// Everything the VMM needs from its environment.
pub trait Platform: Console + CpuControl {}

impl<T: Console + CpuControl> Platform for T {}

/// The bare-metal platform: QEMU debug console, `invlpg`, `cli; hlt`.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[derive(Debug, Default, Copy, Clone)]
pub struct X86Platform {
    console: kernel_qemu::DebugConsole,
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl X86Platform {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            console: kernel_qemu::DebugConsole,
        }
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl core::fmt::Write for X86Platform {
    #[inline]
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.console.write_str(s)
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl CpuControl for X86Platform {
    #[inline]
    fn invalidate_tlb_entry(&mut self, va: VirtualAddress) {
        // SAFETY: invlpg has no memory effects beyond the TLB.
        unsafe { kernel_registers::tlb::invalidate_page(va) }
    }

    fn shutdown(&mut self) -> ! {
        kernel_qemu::qemu_trace!("vmm: halting\n");
        kernel_registers::tlb::halt()
    }
}
