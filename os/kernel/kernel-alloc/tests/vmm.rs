use kernel_alloc::console::Console;
use kernel_alloc::frame_alloc::BumpFrameAlloc;
use kernel_alloc::platform::CpuControl;
use kernel_alloc::vmm::{Vmm, VmmError};
use kernel_vmem::addresses::{PhysicalAddress, PhysicalPage, VirtualAddress};
use kernel_vmem::{EntryState, PdIndex, PhysMapper, PhysMapperExt, PtEntry, PtIndex};
use std::cell::UnsafeCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

const BASE: u32 = 0x0010_0000;

#[repr(C, align(4096))]
struct Frame(UnsafeCell<[u8; 4096]>);

/// Physical memory from `BASE` upward, pre-filled with `0xAA`.
struct TestPhys {
    frames: Vec<Frame>,
}

impl TestPhys {
    fn with_frames(n: usize) -> Self {
        Self {
            frames: (0..n).map(|_| Frame(UnsafeCell::new([0xAA; 4096]))).collect(),
        }
    }

    fn end(&self) -> u32 {
        BASE + u32::try_from(self.frames.len()).unwrap() * 4096
    }
}

impl PhysMapper for TestPhys {
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T {
        let rel = pa.as_u32() - BASE;
        assert_eq!(rel & 0xFFF, 0, "unaligned frame access");
        let idx = (rel >> 12) as usize;
        unsafe { &mut *self.frames[idx].0.get().cast::<T>() }
    }
}

/// Records console text and TLB invalidations; `shutdown` panics.
#[derive(Default)]
struct TestPlatform {
    console: String,
    invalidated: Vec<u32>,
}

impl fmt::Write for TestPlatform {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.console.push_str(s);
        Ok(())
    }
}

impl CpuControl for TestPlatform {
    fn invalidate_tlb_entry(&mut self, va: VirtualAddress) {
        self.invalidated.push(va.as_u32());
    }

    fn shutdown(&mut self) -> ! {
        panic!("shutdown");
    }
}

type TestVmm<'m> = Vmm<'m, TestPhys, BumpFrameAlloc, TestPlatform>;

fn vmm(phys: &TestPhys) -> TestVmm<'_> {
    Vmm::new(
        phys,
        BumpFrameAlloc::with_range(BASE, phys.end()),
        TestPlatform::default(),
    )
}

fn va(v: u32) -> VirtualAddress {
    VirtualAddress::new(v)
}

fn pa(v: u32) -> PhysicalAddress {
    PhysicalAddress::new(v)
}

fn resolve(vmm: &TestVmm<'_>, v: u32) -> u32 {
    vmm.resolve(va(v)).map_or(0xFFFF_FFFF, PhysicalAddress::as_u32)
}

/// The raw leaf entry for `v`; the table must exist.
fn leaf(phys: &TestPhys, vmm: &TestVmm<'_>, v: u32) -> PtEntry {
    let root = vmm.root().expect("directory");
    let pde = phys.directory_mut(root).get(PdIndex::from(va(v)));
    phys.table_mut(pde.table()).get(PtIndex::from(va(v)))
}

/// Pretend the MMU touched the page at `v`.
fn hardware_sets(phys: &TestPhys, vmm: &TestVmm<'_>, v: u32, bits: u32) {
    let root = vmm.root().expect("directory");
    let pde = phys.directory_mut(root).get(PdIndex::from(va(v)));
    let table = phys.table_mut(pde.table());
    let i = PtIndex::from(va(v));
    table.set(i, PtEntry::from_raw(table.get(i).raw() | bits));
}

#[test]
fn first_allocation() {
    let phys = TestPhys::with_frames(4);
    let mut vmm = vmm(&phys);

    let f1 = vmm.allocate_frame().unwrap();
    let f2 = vmm.allocate_frame().unwrap();
    assert_eq!(f1.base(), pa(0x0010_0000));
    assert_eq!(f2.base(), pa(0x0010_1000));
    assert!(vmm.frame_bytes(f1).iter().all(|&b| b == 0));
    assert!(vmm.frame_bytes(f2).iter().all(|&b| b == 0));
}

#[test]
fn frames_are_aligned_and_consecutive() {
    let phys = TestPhys::with_frames(16);
    let mut vmm = vmm(&phys);

    let mut prev = vmm.allocate_frame().unwrap().base().as_u32();
    for _ in 0..8 {
        let next = vmm.allocate_frame().unwrap().base().as_u32();
        assert_eq!(next & 0xFFF, 0);
        assert_eq!(next - prev, 4096);
        prev = next;
    }
    assert_eq!(vmm.frame_alloc().allocated(), 9);
}

#[test]
fn identity_mapping() {
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);

    vmm.map(va(0x0020_0000), pa(0x0020_0000)).unwrap();
    assert_eq!(resolve(&vmm, 0x0020_0000), 0x0020_0000);
    assert_eq!(resolve(&vmm, 0x0020_0abc), 0x0020_0abc);
    assert_eq!(vmm.entry_state(va(0x0020_0000)), EntryState::Mapped);
}

#[test]
fn lazy_table_creation() {
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);

    vmm.map(va(0x4000_0000), pa(0x0040_0000)).unwrap();

    // Directory plus one page table.
    assert_eq!(vmm.frame_alloc().allocated(), 2);

    let root = vmm.root().unwrap();
    assert_eq!(root.base(), pa(0x0010_0000));
    let pde = phys.directory_mut(root).get(PdIndex::new(0x100));
    assert!(pde.is_present());
    assert_eq!(pde.table().base(), pa(0x0010_1000));

    let pte = phys.table_mut(pde.table()).get(PtIndex::new(0));
    assert!(pte.is_present());
    assert_eq!(pte.frame().base(), pa(0x0040_0000));
}

#[test]
fn page_table_for_creates_directory_then_table() {
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);

    let table = vmm.page_table_for(va(0x0040_1000)).unwrap();
    assert_eq!(vmm.root().map(PhysicalPage::base), Some(pa(0x0010_0000)));
    assert_eq!(table.base(), pa(0x0010_1000));

    // Same 4 MiB window, same table.
    assert_eq!(vmm.page_table_for(va(0x007F_FFFF)).unwrap(), table);
    assert_eq!(vmm.frame_alloc().allocated(), 2);
    assert_eq!(vmm.frame_alloc().next_free(), pa(0x0010_2000));
}

#[test]
fn lookups_on_a_fresh_vmm_allocate_nothing() {
    let phys = TestPhys::with_frames(4);
    let mut vmm = vmm(&phys);

    assert_eq!(resolve(&vmm, 0x0020_0000), 0xFFFF_FFFF);
    vmm.unmap(va(0x0020_0000));
    assert_eq!(vmm.entry_state(va(0x0020_0000)), EntryState::Never);

    assert!(vmm.root().is_none());
    assert_eq!(vmm.allocate_frame().unwrap().base(), pa(0x0010_0000));
}

#[test]
fn unmap_keeps_stale_entry() {
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);
    vmm.map(va(0x0020_0000), pa(0x0020_0000)).unwrap();

    vmm.unmap(va(0x0020_0000));

    assert!(!leaf(&phys, &vmm, 0x0020_0000).is_present());
    assert_eq!(vmm.platform().invalidated, vec![0x0020_0000]);
    assert_eq!(resolve(&vmm, 0x0020_0000), 0x0020_0000);
    assert_eq!(vmm.entry_state(va(0x0020_0000)), EntryState::Stale);
}

#[test]
fn page_fault_maps_a_zeroed_frame() {
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);
    assert_eq!(resolve(&vmm, 0x8000_0000), 0xFFFF_FFFF);

    vmm.page_fault(va(0x8000_0000));

    assert_eq!(vmm.platform().console, "page fault @ 0x80000000\n");
    let backing = resolve(&vmm, 0x8000_0000);
    assert!(backing >= 0x0010_0000);
    assert_eq!(backing & 0xFFF, 0);
    let frame = PhysicalPage::from_addr(pa(backing));
    assert!(vmm.frame_bytes(frame).iter().all(|&b| b == 0));
}

#[test]
fn page_fault_aligns_the_faulting_address() {
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);

    vmm.page_fault(va(0x8000_1234));

    assert_eq!(vmm.platform().console, "page fault @ 0x80001234\n");
    let backing = resolve(&vmm, 0x8000_1000);
    assert_eq!(resolve(&vmm, 0x8000_1234), backing | 0x234);
    assert_eq!(vmm.entry_state(va(0x8000_1000)), EntryState::Mapped);
}

#[test]
fn unmap_of_never_mapped_is_a_no_op() {
    let phys = TestPhys::with_frames(8);

    // No directory at all.
    let mut fresh = vmm(&phys);
    fresh.unmap(va(0xdead_0000));
    assert!(fresh.platform().invalidated.is_empty());
    assert!(fresh.root().is_none());

    // Directory exists, slot 0x37a does not.
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);
    vmm.map(va(0x0020_0000), pa(0x0020_0000)).unwrap();
    let allocated = vmm.frame_alloc().allocated();

    vmm.unmap(va(0xdead_0000));

    assert!(vmm.platform().invalidated.is_empty());
    assert_eq!(vmm.frame_alloc().allocated(), allocated);
    assert_eq!(resolve(&vmm, 0xdead_0000), 0xFFFF_FFFF);
}

#[test]
fn map_then_unmap_invalidates_exactly_once() {
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);

    vmm.map(va(0x0040_0000), pa(0x0050_0000)).unwrap();
    assert!(vmm.platform().invalidated.is_empty());
    vmm.unmap(va(0x0040_0000));

    assert!(!leaf(&phys, &vmm, 0x0040_0000).is_present());
    assert_eq!(vmm.platform().invalidated, vec![0x0040_0000]);
}

#[test]
fn page_directory_is_created_once() {
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);

    let a = vmm.page_directory().unwrap();
    let b = vmm.page_directory().unwrap();
    vmm.map(va(0x0020_0000), pa(0x0020_0000)).unwrap();
    let c = vmm.page_directory().unwrap();

    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(vmm.root(), Some(a));
}

#[test]
fn remap_reflects_the_second_frame() {
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);

    vmm.map(va(0x0060_0000), pa(0x0070_0000)).unwrap();
    vmm.map(va(0x0060_0000), pa(0x0090_0000)).unwrap();

    assert_eq!(resolve(&vmm, 0x0060_0000), 0x0090_0000);
    // Overwriting never invalidates.
    assert!(vmm.platform().invalidated.is_empty());
}

#[test]
fn resolve_of_unwritten_directory_slot() {
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);
    assert_eq!(resolve(&vmm, 0x0020_0000), 0xFFFF_FFFF);

    vmm.map(va(0x0020_0000), pa(0x0020_0000)).unwrap();
    assert_eq!(resolve(&vmm, 0x4000_0000), 0xFFFF_FFFF);
    // Same table, never-written leaf.
    assert_eq!(resolve(&vmm, 0x0020_1010), 0x0000_0010);
}

#[test]
fn map_writes_frame_and_present_only() {
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);

    vmm.map(va(0x0020_0000), pa(0x0030_0FFF)).unwrap();
    assert_eq!(leaf(&phys, &vmm, 0x0020_0000).raw(), 0x0030_0001);

    hardware_sets(&phys, &vmm, 0x0020_0000, 0x60);
    assert!(vmm.is_dirty(va(0x0020_0000)).unwrap());

    // A fresh mapping starts clean.
    vmm.map(va(0x0020_0000), pa(0x0030_0000)).unwrap();
    assert_eq!(leaf(&phys, &vmm, 0x0020_0000).raw(), 0x0030_0001);
    assert!(!vmm.is_dirty(va(0x0020_0000)).unwrap());
    assert!(!vmm.is_accessed(va(0x0020_0000)).unwrap());
}

#[test]
fn dirty_and_accessed_follow_hardware_bits() {
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);
    vmm.map(va(0x0020_0000), pa(0x0020_0000)).unwrap();

    assert!(!vmm.is_accessed(va(0x0020_0000)).unwrap());
    assert!(!vmm.is_dirty(va(0x0020_0000)).unwrap());

    hardware_sets(&phys, &vmm, 0x0020_0000, 1 << 5);
    assert!(vmm.is_accessed(va(0x0020_0000)).unwrap());
    assert!(!vmm.is_dirty(va(0x0020_0000)).unwrap());

    hardware_sets(&phys, &vmm, 0x0020_0000, 1 << 6);
    assert!(vmm.is_dirty(va(0x0020_0000)).unwrap());

    // Cleared present bit does not hide the status bits.
    vmm.unmap(va(0x0020_0000));
    assert!(vmm.is_dirty(va(0x0020_0000)).unwrap());
    assert!(vmm.is_accessed(va(0x0020_0000)).unwrap());
}

#[test]
fn status_queries_create_the_page_table() {
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);

    assert!(!vmm.is_dirty(va(0x4000_0000)).unwrap());
    assert_eq!(vmm.frame_alloc().allocated(), 2);
    // The slot now exists, so resolve no longer reports it as unmapped.
    assert_eq!(resolve(&vmm, 0x4000_0000), 0);

    assert!(!vmm.is_accessed(va(0x8000_0000)).unwrap());
    assert_eq!(vmm.frame_alloc().allocated(), 3);
}

#[test]
fn entry_state_transitions() {
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);
    let v = va(0x00C0_0000);

    assert_eq!(vmm.entry_state(v), EntryState::Never);
    vmm.map(v, pa(0x0020_0000)).unwrap();
    assert_eq!(vmm.entry_state(v), EntryState::Mapped);
    vmm.map(v, pa(0x0030_0000)).unwrap();
    assert_eq!(vmm.entry_state(v), EntryState::Mapped);
    vmm.unmap(v);
    assert_eq!(vmm.entry_state(v), EntryState::Stale);
    vmm.map(v, pa(0x0040_0000)).unwrap();
    assert_eq!(vmm.entry_state(v), EntryState::Mapped);
    assert_eq!(resolve(&vmm, 0x00C0_0000), 0x0040_0000);

    // Querying never allocates.
    let before = vmm.frame_alloc().allocated();
    assert_eq!(vmm.entry_state(va(0x9000_0000)), EntryState::Never);
    assert_eq!(vmm.frame_alloc().allocated(), before);
}

#[test]
fn dump_lists_written_entries() {
    let phys = TestPhys::with_frames(8);
    let mut vmm = vmm(&phys);
    vmm.map(va(0x0020_0000), pa(0x0020_0000)).unwrap();
    vmm.map(va(0x4000_0000), pa(0x0040_0000)).unwrap();
    vmm.unmap(va(0x0020_0000));

    vmm.dump().unwrap();

    assert_eq!(
        vmm.platform().console,
        "PD @ 0x100000\n\
         \x20   0x0) PDE = 0x101001\n\
         \x20       0x200) PTE = 0x200000\n\
         \x20   0x100) PDE = 0x102001\n\
         \x20       0x0) PTE = 0x400001\n"
    );
}

#[test]
fn dump_of_fresh_vmm_creates_the_directory() {
    let phys = TestPhys::with_frames(2);
    let mut vmm = vmm(&phys);

    vmm.dump().unwrap();

    assert_eq!(vmm.platform().console, "PD @ 0x100000\n");
    assert_eq!(vmm.frame_alloc().allocated(), 1);
}

#[test]
fn map_reports_out_of_frames() {
    let phys = TestPhys::with_frames(1);
    let mut vmm = vmm(&phys);

    assert_eq!(
        vmm.map(va(0x0020_0000), pa(0x0020_0000)),
        Err(VmmError::OutOfFrames)
    );
    // The directory was created; only the table failed.
    assert!(vmm.root().is_some());
    assert_eq!(resolve(&vmm, 0x0020_0000), 0xFFFF_FFFF);
}

#[test]
fn page_fault_without_frames_is_fatal() {
    let phys = TestPhys::with_frames(1);
    let mut vmm = vmm(&phys);

    let result = panic::catch_unwind(AssertUnwindSafe(|| vmm.page_fault(va(0x8000_0000))));

    assert!(result.is_err());
    assert_eq!(
        vmm.platform().console,
        "page fault @ 0x80000000\nvmm: fatal: out of physical frames\n"
    );
}

#[test]
fn console_helpers_compose() {
    let mut platform = TestPlatform::default();
    platform.emit_labeled_hex("PD @ ", 0x0010_0000);
    platform.emit_decimal(1024);
    assert_eq!(platform.console, "PD @ 0x100000\n1024");
}
