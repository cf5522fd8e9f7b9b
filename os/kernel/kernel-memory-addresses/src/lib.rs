//! # 32-bit Virtual and Physical Memory Address Types
//!
//! Typed wrappers for the addresses the two-level (PD → PT) paging code
//! passes around, so that a frame address is never handed to something that
//! expects a virtual one.
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`VirtualAddress`] | Any 32-bit virtual address. |
//! | [`PhysicalAddress`] | A physical address (RAM frame, page table). |
//! | [`VirtualPage<S>`] / [`PhysicalPage<S>`] | A page-aligned base of size `S`. |
//! | [`PageOffset<S>`] | The low `S::SHIFT` bits of an address. |
//!
//! All of them are `u32` newtypes. [`Size4K`] is the only page size: frames,
//! page tables and leaf mappings are all 4 KiB.
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let pa = PhysicalAddress::new(0x0020_0ABC);
//! let frame = pa.page::<Size4K>();
//! assert_eq!(frame.base().as_u32(), 0x0020_0000);
//! assert_eq!(frame.join(pa.offset()), pa);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod memory_address;
mod page;
mod physical;
mod virt;

pub use crate::memory_address::MemoryAddress;
pub use crate::page::{MemoryPage, PageOffset, PageSize, Size4K};
pub use crate::physical::{PhysicalAddress, PhysicalPage};
pub use crate::virt::{VirtualAddress, VirtualPage};
