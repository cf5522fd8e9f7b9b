//! # Kernel Configuration
//!
//! Compile-time configuration shared by the paging crates: where physical
//! frame allocation starts and ends, the frame and table geometry of 32-bit
//! two-level paging, and the sentinel used by the raw translation entry point.
//!
//! ## Physical Memory Layout
//!
//! ```text
//! 0x0000_0000 ┌─────────────────────────────────┐
//!             │     Low Memory (< 1 MiB)        │
//!             │  (BIOS, VGA, real-mode data)    │
//! 0x0010_0000 ├─────────────────────────────────┤ LOW_MEMORY_BOUNDARY
//!             │  Frames handed out by the bump  │
//!             │  allocator, bottom to top       │
//! 0x0800_0000 ├─────────────────────────────────┤ PHYS_MEMORY_END
//!             │        (not managed)            │
//! 0xFFFF_FFFF └─────────────────────────────────┘
//! ```
//!
//! All values are `const`; compile-time assertions reject inconsistent
//! layouts.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod memory;
