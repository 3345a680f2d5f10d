//! # Memory Layout

/// Size of one physical frame in bytes.
pub const PAGE_SIZE: u64 = 4096;

/// Number of cores the kernel brings up; each one owns a free-frame list.
pub const MAX_CORES: usize = 8;

/// A simple Higher Half Direct Map (HHDM) base.
/// Anything you map at [`HHDM_BASE`] + `pa` lets the kernel
/// access physical memory via a fixed offset.
pub const HHDM_BASE: u64 = 0xffff_8880_0000_0000;

/// Where you place the bytes in *physical* memory (LMA) before paging.
///
/// # Kernel Build
/// This information is sourced in the kernel's `build.rs` to configure
/// the linker.
pub const PHYS_LOAD: u64 = 0x0010_0000; // 1 MiB

/// Amount of RAM handed to the frame pool, counted from [`PHYS_LOAD`].
pub const PHYS_MEM_SIZE: u64 = 128 * 1024 * 1024; // 128 MiB

/// First physical address past the RAM managed by the frame pool.
pub const PHYS_TOP: u64 = PHYS_LOAD + PHYS_MEM_SIZE;

const _: () = {
    assert!(PAGE_SIZE.is_power_of_two());
    assert!(MAX_CORES > 0);
    assert!(PHYS_LOAD.is_multiple_of(PAGE_SIZE));
    assert!(PHYS_TOP.is_multiple_of(PAGE_SIZE));
    assert!(PHYS_TOP > PHYS_LOAD);
    assert!(HHDM_BASE.checked_add(PHYS_TOP).is_some());
};
