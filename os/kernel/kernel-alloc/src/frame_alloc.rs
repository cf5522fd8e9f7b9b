//! Monotonic bump allocator for physical frames.
//!
//! Frames are handed out in ascending order starting at the first frame above
//! reserved low memory and are never returned. The allocator does not touch
//! the frames it hands out; zero-filling is done by the VMM through its
//! [`PhysMapper`](kernel_vmem::PhysMapper).

use kernel_info::memory::{FRAME_SIZE, LOW_MEMORY_BOUNDARY, PHYS_MEMORY_END};
use kernel_vmem::FrameAlloc;
use kernel_vmem::addresses::{PhysicalAddress, PhysicalPage, Size4K};

/// Bump allocator over `[next, end)`.
#[derive(Debug, Clone)]
pub struct BumpFrameAlloc {
    /// Next frame to hand out; always 4 KiB-aligned, never decreases.
    next: u32,
    /// Exclusive upper bound.
    end: u32,
    start: u32,
}

impl BumpFrameAlloc {
    /// The default pool: [`LOW_MEMORY_BOUNDARY`] up to [`PHYS_MEMORY_END`].
    #[must_use]
    pub const fn new() -> Self {
        Self::with_range(LOW_MEMORY_BOUNDARY, PHYS_MEMORY_END)
    }

    /// A pool over `[start, end)`. Both bounds are aligned down to a frame.
    #[must_use]
    pub const fn with_range(start: u32, end: u32) -> Self {
        let start = start & !(FRAME_SIZE - 1);
        Self {
            next: start,
            end: end & !(FRAME_SIZE - 1),
            start,
        }
    }

    /// The allocation cursor: the address the next call will return.
    #[inline]
    #[must_use]
    pub const fn next_free(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.next)
    }

    /// Number of frames handed out so far.
    #[inline]
    #[must_use]
    pub const fn allocated(&self) -> u32 {
        (self.next - self.start) / FRAME_SIZE
    }
}

impl Default for BumpFrameAlloc {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAlloc for BumpFrameAlloc {
    fn alloc_4k(&mut self) -> Option<PhysicalPage<Size4K>> {
        let after = self.next.checked_add(FRAME_SIZE)?;
        if after > self.end {
            log::trace!("frame pool exhausted at {:#010x}", self.next);
            return None;
        }
        let frame = PhysicalPage::from_addr(PhysicalAddress::new(self.next));
        self.next = after;
        log::trace!("allocated frame {frame} ({} in use)", self.allocated());
        Some(frame)
    }
}
