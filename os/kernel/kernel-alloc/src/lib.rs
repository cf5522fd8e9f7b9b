//! # Kernel Memory Allocation and Virtual Memory Management
//!
//! Physical frame allocation and the virtual memory manager of a 32-bit
//! kernel, on top of the paging types in `kernel-vmem`.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │            Virtual Memory Manager (VMM)             │
//! │    • map / unmap / resolve / dirty / accessed       │
//! │    • demand paging on page faults                   │
//! │    • table dumps to the console                     │
//! └───────────┬───────────────────────────┬─────────────┘
//!             │                           │
//! ┌───────────▼─────────────┐ ┌───────────▼─────────────┐
//! │   Physical Mapper       │ │   Platform              │
//! │   • identity map        │ │   • console             │
//! │                         │ │   • invlpg, shutdown    │
//! └───────────┬─────────────┘ └─────────────────────────┘
//!             │
//! ┌───────────▼─────────────────────────────────────────┐
//! │           Physical Frame Allocator                  │
//! │    • 4 KiB frames from 1 MiB upward                 │
//! │    • bump cursor, no reuse                          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Components
//!
//! - [`frame_alloc`]: the bump allocator. Frames are never freed.
//! - [`phys_mapper`]: physical-to-pointer conversion for identity-mapped
//!   low memory.
//! - [`console`] and [`platform`]: what the VMM needs from the outside world.
//! - [`vmm`]: the [`Vmm`](vmm::Vmm) itself, an explicit instance generic over
//!   the three collaborators above.
//! - `kernel_vmm` (x86 only): the kernel's canonical instance and the raw
//!   `u32` functions the rest of the kernel and the trap path call.
//!
//! ## Usage
//! ```rust,no_run
//! # #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
//! # {
//! use kernel_alloc::kernel_vmm;
//!
//! kernel_vmm::init();
//! kernel_vmm::map(0x0020_0000, 0x0020_0000);
//! assert_eq!(kernel_vmm::resolve(0x0020_0abc), 0x0020_0abc);
//! # }
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod console;
pub mod frame_alloc;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub mod kernel_vmm;
pub mod phys_mapper;
pub mod platform;
pub mod vmm;
