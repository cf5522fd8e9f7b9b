//! # Typed 32-bit x86 Control Registers
//!
//! Bitfield models of the control registers the paging code touches (CR0 for
//! the paging enable bit, CR3 for the page directory base) and the two CPU
//! primitives the virtual memory manager consumes: single-page TLB
//! invalidation and an emergency halt.
//!
//! Register encodings are always available; the instructions themselves are
//! only compiled with the `asm` feature on x86 targets.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(feature = "cr0")]
pub mod cr0;

#[cfg(feature = "cr3")]
pub mod cr3;

#[cfg(all(feature = "tlb", any(target_arch = "x86", target_arch = "x86_64")))]
pub mod tlb;

pub trait LoadRegisterUnsafe {
    /// # Safety
    /// The caller must uphold the implementation-specific safety requirements.
    /// For example, the register access might be privileged and require kernel mode (Ring 0).
    unsafe fn load_unsafe() -> Self;
}

pub trait StoreRegisterUnsafe {
    /// # Safety
    /// The caller must uphold the implementation-specific safety requirements.
    /// Writing control registers changes the translation regime of the CPU.
    unsafe fn store_unsafe(self);
}
