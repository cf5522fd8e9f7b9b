//! # Memory Layout

use kernel_memory_addresses::{PageSize, Size4K};

/// Size of one physical frame (and of one page table) in bytes.
pub const FRAME_SIZE: u32 = Size4K::SIZE;

/// Number of 32-bit entries in a page directory or page table.
pub const TABLE_ENTRIES: usize = (FRAME_SIZE / 4) as usize;

/// First frame above reserved low memory (1 MiB).
///
/// The frame allocator starts its cursor here; the first allocation of a
/// fresh kernel (the page directory) lands exactly at this address.
pub const LOW_MEMORY_BOUNDARY: u32 = 0x0010_0000;

/// Exclusive upper bound of the default frame pool (128 MiB).
pub const PHYS_MEMORY_END: u32 = 0x0800_0000;

/// Value returned by the raw `resolve` entry point for a virtual address
/// whose page directory slot was never populated.
pub const UNMAPPED: u32 = 0xFFFF_FFFF;

const _: () = {
    assert!(LOW_MEMORY_BOUNDARY.is_multiple_of(FRAME_SIZE));
    assert!(PHYS_MEMORY_END.is_multiple_of(FRAME_SIZE));
    assert!(PHYS_MEMORY_END > LOW_MEMORY_BOUNDARY);
    assert!(TABLE_ENTRIES == 1024);
    assert!(UNMAPPED & (FRAME_SIZE - 1) != 0);
};
