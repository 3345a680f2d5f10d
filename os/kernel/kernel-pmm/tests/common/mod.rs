//! Host-side stand-in for the machine the frame pool runs on.
//!
//! * "Physical memory" is a page-aligned heap buffer, reached through an
//!   [`HhdmPhysMapper`] whose offset points physical [`PHYS_BASE`] at it.
//! * Each test thread pretends to be one core: [`bind_core`] sets a
//!   thread-local core id, and a thread-local flag plays the interrupt
//!   enable bit.
//! * `halt` unwinds with the [`FrameFault`] as panic payload so tests can
//!   inspect it with [`expect_halt`].

#![allow(dead_code)]

use kernel_pmm::{
    FrameFault, FrameLayout, FrameRegistry, HhdmPhysMapper, PhysMapper, PhysicalAddress,
    PhysicalFrame, Platform,
};
use kernel_sync::InterruptControl;
use std::alloc::{Layout, alloc_zeroed, dealloc};
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const PAGE: u64 = 4096;

/// Physical address of the first arena page.
pub const PHYS_BASE: u64 = 0x8000_0000;

thread_local! {
    static CORE: Cell<usize> = const { Cell::new(0) };
    static IRQ_ENABLED: Cell<bool> = const { Cell::new(true) };
}

/// Makes the calling thread report `core` as its core id.
pub fn bind_core(core: usize) {
    CORE.with(|c| c.set(core));
}

pub fn interrupts_enabled_here() -> bool {
    IRQ_ENABLED.with(Cell::get)
}

pub fn pa(offset_pages: u64) -> PhysicalAddress {
    PhysicalAddress::new(PHYS_BASE + offset_pages * PAGE)
}

pub struct TestPlatform {
    arena: NonNull<u8>,
    pages: usize,
    mapper: HhdmPhysMapper,
    core_reads: AtomicUsize,
    unmasked_core_reads: AtomicUsize,
}

// SAFETY: the arena is only touched through the pool, which synchronizes.
unsafe impl Send for TestPlatform {}
unsafe impl Sync for TestPlatform {}

impl TestPlatform {
    pub fn new(pages: usize) -> Self {
        let arena = NonNull::new(unsafe { alloc_zeroed(Self::arena_layout(pages)) })
            .expect("arena allocation");
        let va = arena.as_ptr().expose_provenance() as u64;
        Self {
            arena,
            pages,
            mapper: HhdmPhysMapper::new(va.wrapping_sub(PHYS_BASE)),
            core_reads: AtomicUsize::new(0),
            unmasked_core_reads: AtomicUsize::new(0),
        }
    }

    fn arena_layout(pages: usize) -> Layout {
        Layout::from_size_align(pages * PAGE as usize, PAGE as usize).unwrap()
    }

    /// `[PHYS_BASE, PHYS_BASE + pages * PAGE)`.
    pub fn full_layout(&self) -> FrameLayout {
        FrameLayout::new(pa(0), pa(self.pages as u64)).unwrap()
    }

    pub fn frame_bytes(&self, frame: PhysicalFrame) -> &[u8] {
        let ptr = self.mapper.phys_to_ptr(frame.start_address());
        unsafe { std::slice::from_raw_parts(ptr, PAGE as usize) }
    }

    pub fn write_byte(&self, addr: PhysicalAddress, value: u8) {
        unsafe { self.mapper.phys_to_ptr(addr).write(value) }
    }

    pub fn write_word(&self, addr: PhysicalAddress, value: u64) {
        for (i, byte) in (0u64..).zip(value.to_ne_bytes()) {
            self.write_byte(addr + i, byte);
        }
    }

    pub fn core_reads(&self) -> usize {
        self.core_reads.load(Ordering::SeqCst)
    }

    pub fn unmasked_core_reads(&self) -> usize {
        self.unmasked_core_reads.load(Ordering::SeqCst)
    }
}

impl Drop for TestPlatform {
    fn drop(&mut self) {
        unsafe { dealloc(self.arena.as_ptr(), Self::arena_layout(self.pages)) }
    }
}

impl InterruptControl for TestPlatform {
    fn interrupts_enabled(&self) -> bool {
        interrupts_enabled_here()
    }

    fn disable_interrupts(&self) {
        IRQ_ENABLED.with(|f| f.set(false));
    }

    fn enable_interrupts(&self) {
        IRQ_ENABLED.with(|f| f.set(true));
    }
}

impl Platform for TestPlatform {
    type Mapper = HhdmPhysMapper;

    fn mapper(&self) -> &HhdmPhysMapper {
        &self.mapper
    }

    fn current_core(&self) -> usize {
        self.core_reads.fetch_add(1, Ordering::SeqCst);
        if interrupts_enabled_here() {
            self.unmasked_core_reads.fetch_add(1, Ordering::SeqCst);
        }
        CORE.with(Cell::get)
    }

    fn halt(&self, fault: &FrameFault) -> ! {
        panic::panic_any(*fault)
    }
}

/// A pool over a fresh `pages`-page arena managing all of it, still empty.
pub fn registry<const CORES: usize>(pages: usize) -> FrameRegistry<TestPlatform, CORES> {
    let platform = TestPlatform::new(pages);
    let layout = platform.full_layout();
    // SAFETY: the arena backs exactly the layout and belongs to the pool.
    unsafe { FrameRegistry::new(platform, layout) }
}

/// A pool whose whole arena has been reclaimed on core 0.
pub fn seeded<const CORES: usize>(pages: usize) -> FrameRegistry<TestPlatform, CORES> {
    let frames = registry::<CORES>(pages);
    bind_core(0);
    let reclaimed = unsafe { frames.reclaim_all() };
    assert_eq!(reclaimed, pages);
    frames
}

/// Allocates until the pool reports exhaustion.
pub fn drain<const CORES: usize>(frames: &FrameRegistry<TestPlatform, CORES>) -> Vec<PhysicalFrame> {
    std::iter::from_fn(|| frames.allocate()).collect()
}

/// Runs `f`, which must halt, and returns the fault it halted with.
pub fn expect_halt(f: impl FnOnce()) -> FrameFault {
    let payload = panic::catch_unwind(AssertUnwindSafe(f)).expect_err("expected a halt");
    *payload
        .downcast::<FrameFault>()
        .expect("halt payload is a FrameFault")
}
