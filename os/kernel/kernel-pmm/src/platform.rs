//! Capabilities the frame pool borrows from the rest of the kernel.

use crate::addresses::PhysicalAddress;
use crate::error::FrameFault;
use kernel_sync::InterruptControl;

/// Converts physical addresses to pointers in the current address space
/// (e.g., via identity map or a higher-half direct map, HHDM).
///
/// Computing the pointer is safe; dereferencing it is only sound when the
/// implementation actually maps `pa` writable. [`FrameRegistry::new`] makes
/// its caller promise that for the whole managed window.
///
/// [`FrameRegistry::new`]: crate::FrameRegistry::new
pub trait PhysMapper {
    fn phys_to_ptr(&self, pa: PhysicalAddress) -> *mut u8;
}

/// Everything the pool needs from the machine it runs on.
///
/// * interrupt masking (through [`InterruptControl`]) to read the core id
///   without being migrated halfway,
/// * the core id itself,
/// * access to physical memory,
/// * a way to stop the machine on a broken invariant.
pub trait Platform: InterruptControl + Send + Sync {
    type Mapper: PhysMapper;

    fn mapper(&self) -> &Self::Mapper;

    /// Logical id of the executing core, in `0..CORES`.
    ///
    /// Only meaningful while local interrupts are masked; the pool always
    /// calls it under an [`IrqGuard`](kernel_sync::IrqGuard).
    fn current_core(&self) -> usize;

    /// Reports an unrecoverable fault and never returns.
    fn halt(&self, fault: &FrameFault) -> !;
}
