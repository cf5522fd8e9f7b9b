use crate::addresses::{PageSize, PhysicalAddress, Size4K};
use bitfield_struct::bitfield;

/// Represents a single 32-bit page directory or page table entry in its raw
/// bitfield form.
///
/// Both levels of 32-bit paging share this layout, so the same type backs
/// [`PdEntry`](crate::PdEntry) and [`PtEntry`](crate::PtEntry). Each bit
/// corresponds to a hardware-defined flag or address field; the type allows
/// read/write access to individual bits without manual masking or shifting,
/// using the [`bitfield_struct`](https://docs.rs/bitfield-struct/) derive.
///
/// ### Bit layout
///
/// | Bits   | Name / Mnemonic | Meaning |
/// |--------|-----------------|---------|
/// | 0      | `P` (present)   | Valid entry if set |
/// | 1      | `RW`            | Writable if set |
/// | 2      | `US`            | User-mode accessible if set |
/// | 3      | `PWT`           | Write-through caching |
/// | 4      | `PCD`           | Disable caching |
/// | 5      | `A`             | Accessed (set by the CPU) |
/// | 6      | `D`             | Dirty (leaf only, set by the CPU) |
/// | 7–11   | reserved        | PAT/PS, G, OS-available; preserved as read |
/// | 12–31  | `addr`          | Physical frame bits [31:12] |
///
/// ### Example
/// ```rust
/// # use kernel_vmem::addresses::PhysicalAddress;
/// # use kernel_vmem::PageEntryBits;
/// let e = PageEntryBits::new()
///     .with_present(true)
///     .with_frame_base(PhysicalAddress::new(0x0040_0000));
/// assert_eq!(e.into_bits(), 0x0040_0001);
/// ```
#[bitfield(u32)]
pub struct PageEntryBits {
    /// Present (P, bit 0).
    ///
    /// Set if the entry points to a valid page table (directory level) or a
    /// valid 4 KiB frame (table level). Clear implies a not-present entry; the
    /// CPU ignores every other bit and raises a page fault on access.
    pub present: bool,

    /// Writable (RW, bit 1).
    pub writable: bool,

    /// User/Supervisor (US, bit 2).
    pub user_access: bool,

    /// Page Write-Through (PWT, bit 3).
    pub write_through: bool,

    /// Page Cache Disable (PCD, bit 4).
    pub cache_disabled: bool,

    /// Accessed (A, bit 5).
    ///
    /// Set by the CPU on any access through this entry. Software may clear it
    /// to track usage.
    pub accessed: bool,

    /// Dirty (D, bit 6) — **leaf only**.
    ///
    /// Set by the CPU on the first write through a leaf mapping. Ignored in
    /// directory entries.
    pub dirty: bool,

    /// Bits 7..=11: page size / PAT, global, and OS-available bits.
    ///
    /// Not interpreted here; kept intact across read-modify-write updates.
    #[bits(5)]
    pub reserved: u8,

    /// Physical address bits [31:12] (bits 12..=31).
    #[bits(20)]
    frame_number: u32,
}

impl PageEntryBits {
    /// The 4 KiB-aligned physical address stored in bits 31..12.
    #[inline]
    #[must_use]
    pub const fn frame_base(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.frame_number() << Size4K::SHIFT)
    }

    /// Store the upper 20 bits of `phys`; its low 12 bits are dropped.
    #[inline]
    #[must_use]
    pub const fn with_frame_base(self, phys: PhysicalAddress) -> Self {
        self.with_frame_number(phys.as_u32() >> Size4K::SHIFT)
    }
}
