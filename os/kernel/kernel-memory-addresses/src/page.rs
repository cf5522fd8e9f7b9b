use crate::MemoryAddress;
use core::fmt;
use core::hash::Hash;
use core::marker::PhantomData;

mod sealed {
    pub trait Sealed {}
}

/// A supported page size. Sealed; [`Size4K`] is the only implementor.
pub trait PageSize: sealed::Sealed + Copy + Eq + Ord + Hash {
    /// Page size in bytes.
    const SIZE: u32;
    /// `log2(SIZE)`: the number of offset bits.
    const SHIFT: u32;
    /// Short name for formatting, e.g. `4K`.
    const NAME: &'static str;
}

/// 4 KiB: one frame, one page table, one leaf mapping.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Size4K;

impl sealed::Sealed for Size4K {}

impl PageSize for Size4K {
    const SIZE: u32 = 4096;
    const SHIFT: u32 = 12;
    const NAME: &'static str = "4K";
}

const _: () = assert!(1 << Size4K::SHIFT == Size4K::SIZE);

/// An `S`-aligned base address. The low `S::SHIFT` bits are always zero.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MemoryPage<S: PageSize> {
    base: u32,
    _size: PhantomData<S>,
}

impl<S: PageSize> MemoryPage<S> {
    /// The page containing `addr`.
    #[inline]
    #[must_use]
    pub const fn from_addr(addr: MemoryAddress) -> Self {
        Self {
            base: addr.as_u32() & !(S::SIZE - 1),
            _size: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> MemoryAddress {
        MemoryAddress::new(self.base)
    }

    /// `base | off`. Cannot carry: the base is aligned and `off < S::SIZE`.
    #[inline]
    #[must_use]
    pub const fn join(self, off: PageOffset<S>) -> MemoryAddress {
        MemoryAddress::new(self.base | off.as_u32())
    }
}

impl<S: PageSize> fmt::Display for MemoryPage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base(), S::NAME)
    }
}

impl<S: PageSize> fmt::Debug for MemoryPage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryPage<{}>({})", S::NAME, self.base())
    }
}

/// The low `S::SHIFT` bits of an address.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PageOffset<S: PageSize> {
    value: u32,
    _size: PhantomData<S>,
}

impl<S: PageSize> PageOffset<S> {
    #[inline]
    #[must_use]
    pub const fn from_addr(addr: MemoryAddress) -> Self {
        Self {
            value: addr.as_u32() & (S::SIZE - 1),
            _size: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.value
    }
}

impl<S: PageSize> fmt::Debug for PageOffset<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageOffset<{}>({:#X})", S::NAME, self.value)
    }
}
