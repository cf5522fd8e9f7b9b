//! The kernel's single VMM instance and its raw `u32` entry points.
//!
//! The trap path has no way to carry a [`Vmm`] around, so the kernel keeps one
//! behind a spin lock, created by [`init`] or on first use. All functions here
//! take and return plain `u32` addresses and treat every [`VmmError`] as
//! fatal.
//!
//! A fault raised while the lock is held (i.e. inside a VMM operation) cannot
//! be serviced and stops the machine with [`VmmError::Busy`].
//!
//! [`init`] also routes the [`log`] facade to the QEMU debug console, unless
//! the kernel installed a logger of its own first.

use crate::frame_alloc::BumpFrameAlloc;
use crate::phys_mapper::IdentityPhysMapper;
use crate::platform::{CpuControl, X86Platform};
use crate::vmm::{Vmm, VmmError};
use kernel_info::memory::UNMAPPED;
use kernel_qemu::QemuLogger;
use kernel_vmem::addresses::{PhysicalAddress, VirtualAddress};
use log::{LevelFilter, SetLoggerError};

/// The concrete VMM the kernel runs with.
pub type KernelVmm = Vmm<'static, IdentityPhysMapper, BumpFrameAlloc, X86Platform>;

/// Verbosity of the console logger installed by [`init`].
pub const LOG_LEVEL: LevelFilter = if cfg!(debug_assertions) {
    LevelFilter::Debug
} else {
    LevelFilter::Info
};

static MAPPER: IdentityPhysMapper = IdentityPhysMapper;
static KERNEL_VMM: spin::Once<spin::Mutex<KernelVmm>> = spin::Once::new();

/// Create the kernel VMM and install the console logger. Later calls are
/// no-ops.
pub fn init() {
    KERNEL_VMM.call_once(|| {
        kernel_qemu::qemu_trace!("vmm: init\n");
        if install_logger().is_err() {
            log::debug!("vmm: keeping the installed logger");
        }
        spin::Mutex::new(Vmm::new(
            &MAPPER,
            BumpFrameAlloc::new(),
            X86Platform::new(),
        ))
    });
}

fn install_logger() -> Result<(), SetLoggerError> {
    QemuLogger::new(LOG_LEVEL).init()
}

/// Run `f` on the kernel VMM; any error or re-entry is fatal.
fn with_vmm<R>(f: impl FnOnce(&mut KernelVmm) -> Result<R, VmmError>) -> R {
    init();
    let Some(lock) = KERNEL_VMM.get() else {
        busy()
    };
    let Some(mut vmm) = lock.try_lock() else {
        busy()
    };
    match f(&mut vmm) {
        Ok(r) => r,
        Err(e) => vmm.fatal(e),
    }
}

#[cold]
fn busy() -> ! {
    log::error!("vmm: fatal: {}", VmmError::Busy);
    kernel_qemu::qemu_trace!("vmm: fatal: {}\n", VmmError::Busy);
    X86Platform::new().shutdown()
}

/// Allocate one zero-filled frame and return its physical address.
#[must_use]
pub fn allocate_frame() -> u32 {
    with_vmm(|vmm| vmm.allocate_frame()).base().as_u32()
}

/// Map the page containing `va` to the frame containing `pa`.
pub fn map(va: u32, pa: u32) {
    with_vmm(|vmm| vmm.map(VirtualAddress::new(va), PhysicalAddress::new(pa)));
}

/// Unmap the page containing `va`.
pub fn unmap(va: u32) {
    with_vmm(|vmm| {
        vmm.unmap(VirtualAddress::new(va));
        Ok(())
    });
}

/// Physical address for `va`, or [`UNMAPPED`].
#[must_use]
pub fn resolve(va: u32) -> u32 {
    with_vmm(|vmm| Ok(vmm.resolve(VirtualAddress::new(va))))
        .map_or(UNMAPPED, PhysicalAddress::as_u32)
}

#[must_use]
pub fn is_dirty(va: u32) -> bool {
    with_vmm(|vmm| vmm.is_dirty(VirtualAddress::new(va)))
}

#[must_use]
pub fn is_accessed(va: u32) -> bool {
    with_vmm(|vmm| vmm.is_accessed(VirtualAddress::new(va)))
}

/// Print the page directory and tables to the debug console.
pub fn dump() {
    with_vmm(KernelVmm::dump);
}

/// Trap-path entry point: service a page fault at `va`.
#[unsafe(no_mangle)]
pub extern "C" fn page_fault(va: u32) {
    with_vmm(|vmm| {
        vmm.page_fault(VirtualAddress::new(va));
        Ok(())
    });
}
